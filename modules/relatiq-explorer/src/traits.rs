// Trait seam for the knowledge-graph backend.
//
// The session only talks to `ExplorerApi`; production wires in
// `RelatiqClient`, tests wire in `testing::MockApi`.

use anyhow::Result;
use async_trait::async_trait;

use relatiq_client::RelatiqClient;
use relatiq_common::{
    AgentAnswer, ArticleContent, ArticleSummary, CompanyAnalysis, FilterCriteria, GraphSnapshot,
    InsightKind, NodeId,
};

#[async_trait]
pub trait ExplorerApi: Send + Sync {
    async fn articles(&self, filters: &FilterCriteria) -> Result<Vec<ArticleSummary>>;

    async fn sectors(&self) -> Result<Vec<String>>;

    async fn network(&self, titles: &[String], filters: &FilterCriteria) -> Result<GraphSnapshot>;

    async fn company_analysis(&self, titles: &[String]) -> Result<CompanyAnalysis>;

    /// Node ids the article mentions.
    async fn article_mentions(&self, title: &str) -> Result<Vec<NodeId>>;

    async fn article_content(&self, title: &str) -> Result<ArticleContent>;

    async fn agent_query(&self, question: &str) -> Result<AgentAnswer>;

    /// Markdown insight over the given articles.
    async fn agent_insight(&self, titles: &[String], kind: InsightKind) -> Result<String>;
}

#[async_trait]
impl ExplorerApi for RelatiqClient {
    async fn articles(&self, filters: &FilterCriteria) -> Result<Vec<ArticleSummary>> {
        Ok(RelatiqClient::articles(self, filters).await?)
    }

    async fn sectors(&self) -> Result<Vec<String>> {
        Ok(RelatiqClient::sectors(self).await?)
    }

    async fn network(&self, titles: &[String], filters: &FilterCriteria) -> Result<GraphSnapshot> {
        Ok(RelatiqClient::network(self, titles, filters).await?)
    }

    async fn company_analysis(&self, titles: &[String]) -> Result<CompanyAnalysis> {
        Ok(RelatiqClient::company_analysis(self, titles).await?)
    }

    async fn article_mentions(&self, title: &str) -> Result<Vec<NodeId>> {
        Ok(RelatiqClient::article_mentions(self, title).await?)
    }

    async fn article_content(&self, title: &str) -> Result<ArticleContent> {
        Ok(RelatiqClient::article_content(self, title).await?)
    }

    async fn agent_query(&self, question: &str) -> Result<AgentAnswer> {
        Ok(RelatiqClient::agent_query(self, question).await?)
    }

    async fn agent_insight(&self, titles: &[String], kind: InsightKind) -> Result<String> {
        Ok(RelatiqClient::agent_insight(self, titles, kind).await?)
    }
}
