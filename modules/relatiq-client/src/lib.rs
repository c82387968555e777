pub mod error;
pub mod query;
pub mod types;

pub use error::{ClientError, Result};

use std::time::Duration;

use relatiq_common::{
    AgentAnswer, ArticleContent, ArticleSummary, CompanyAnalysis, Config, FilterCriteria,
    GraphSnapshot, InsightKind, NodeId,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use types::{AgentQueryInput, InsightInput, InsightOutput};

/// Client for the knowledge-graph REST API.
#[derive(Clone)]
pub struct RelatiqClient {
    client: reqwest::Client,
    base_url: String,
}

impl RelatiqClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_base_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List articles matching the filters, newest first.
    pub async fn articles(&self, filters: &FilterCriteria) -> Result<Vec<ArticleSummary>> {
        let articles: Vec<ArticleSummary> = self
            .get("/articles", &query::filter_pairs(filters))
            .await?;
        tracing::debug!(count = articles.len(), "Fetched articles");
        Ok(articles)
    }

    /// Sector names available for filtering.
    pub async fn sectors(&self) -> Result<Vec<String>> {
        self.get("/sectors", &[]).await
    }

    /// Entity graph induced by the selected articles, or the filtered default
    /// view when `titles` is empty.
    pub async fn network(
        &self,
        titles: &[String],
        filters: &FilterCriteria,
    ) -> Result<GraphSnapshot> {
        let snapshot: GraphSnapshot = self
            .get("/graph/network", &query::network_pairs(titles, filters))
            .await?;
        tracing::debug!(
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            "Fetched network"
        );
        Ok(snapshot)
    }

    pub async fn company_analysis(&self, titles: &[String]) -> Result<CompanyAnalysis> {
        self.get("/analysis/companies", &query::title_pairs(titles))
            .await
    }

    /// Node ids mentioned by a single article.
    pub async fn article_mentions(&self, title: &str) -> Result<Vec<NodeId>> {
        self.get("/articles/mentions", &[("title", title.to_string())])
            .await
    }

    pub async fn article_content(&self, title: &str) -> Result<ArticleContent> {
        self.get("/article/content", &[("title", title.to_string())])
            .await
    }

    /// Ask a free-form question of the graph.
    pub async fn agent_query(&self, question: &str) -> Result<AgentAnswer> {
        tracing::info!(question, "Submitting agent query");
        let answer: AgentAnswer = self
            .post("/agent/query", &AgentQueryInput { query: question })
            .await?;
        tracing::info!(
            rows = answer.data.len(),
            nodes = answer.graph.nodes.len(),
            "Agent query answered"
        );
        Ok(answer)
    }

    /// Generate a markdown insight over the given articles.
    pub async fn agent_insight(&self, titles: &[String], kind: InsightKind) -> Result<String> {
        tracing::info!(articles = titles.len(), kind = kind.as_str(), "Requesting insight");
        let output: InsightOutput = self
            .post(
                "/agent/insight",
                &InsightInput {
                    article_titles: titles,
                    analysis_type: kind.as_str(),
                },
            )
            .await?;
        Ok(output.insight)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).query(params).send().await?;
        decode(resp).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.post(&url).json(body).send().await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let body = resp.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = RelatiqClient::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn insight_body_uses_backend_field_names() {
        let titles = vec!["Doc1".to_string()];
        let body = serde_json::to_value(InsightInput {
            article_titles: &titles,
            analysis_type: InsightKind::Risks.as_str(),
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "article_titles": ["Doc1"], "analysis_type": "Risks" })
        );
    }
}
