//! Live session data. Only the session loop writes here, and only with
//! responses the orchestrator accepted.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use relatiq_common::{AgentAnswer, ArticleSummary, CompanyAnalysis, GraphSnapshot};

use crate::orchestrator::Resource;

/// Non-blocking notice that a fetch failed. Prior data stays on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub resource: Resource,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl FetchFailure {
    pub fn new(resource: Resource, error: &anyhow::Error) -> Self {
        Self {
            resource,
            message: format!("{error:#}"),
            at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ExplorerState {
    pub articles: Vec<ArticleSummary>,
    pub sectors: Vec<String>,
    pub graph: Arc<GraphSnapshot>,
    pub analysis: Option<CompanyAnalysis>,
    pub agent_answer: Option<AgentAnswer>,
    /// Markdown from the last insight request.
    pub insight: Option<String>,
    /// Text of the article under the reading cursor.
    pub reading_text: Option<String>,
    pub last_failure: Option<FetchFailure>,
}

impl ExplorerState {
    pub fn article_titles(&self) -> impl Iterator<Item = &str> {
        self.articles.iter().map(|a| a.title.as_str())
    }
}
