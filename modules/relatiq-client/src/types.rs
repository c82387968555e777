use serde::Serialize;

/// Body for `POST /agent/query`.
#[derive(Debug, Clone, Serialize)]
pub struct AgentQueryInput<'a> {
    pub query: &'a str,
}

/// Body for `POST /agent/insight`.
#[derive(Debug, Clone, Serialize)]
pub struct InsightInput<'a> {
    pub article_titles: &'a [String],
    pub analysis_type: &'static str,
}

/// Response of `POST /agent/insight`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct InsightOutput {
    pub insight: String,
}
