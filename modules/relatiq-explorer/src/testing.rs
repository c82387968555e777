// Test doubles for the explorer.
//
// One per collaborator seam:
// - MockApi (ExplorerApi): canned responses, per-call delays, failure injection,
//   and a log of every call made
// - FakeLayout (Layout): static positions plus a record of reheats and camera moves
// - RecordingCanvas (Canvas): records draw operations in order

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use relatiq_common::{
    AgentAnswer, ArticleContent, ArticleSummary, CompanyAnalysis, FilterCriteria, GraphNode,
    GraphSnapshot, InsightKind, NodeId, Point,
};

use crate::orchestrator::Resource;
use crate::render::{Canvas, Layout, LayoutLink, LayoutNode};
use crate::traits::ExplorerApi;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn article(title: &str) -> ArticleSummary {
    ArticleSummary {
        title: title.to_string(),
        date: "2025-01-15".to_string(),
        source: Some("Reuters".to_string()),
        url: None,
        tier: Some("A".to_string()),
        status: Some("Confirmed News".to_string()),
    }
}

pub fn graph_node(id: &str) -> GraphNode {
    GraphNode {
        id: id.into(),
        label: id.to_string(),
        color: "#6366f1".to_string(),
        position: None,
    }
}

/// A snapshot with the given node ids and no edges.
pub fn snapshot(ids: &[&str]) -> GraphSnapshot {
    GraphSnapshot {
        nodes: ids.iter().map(|id| graph_node(id)).collect(),
        edges: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// MockApi
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Articles(FilterCriteria),
    Sectors,
    Network {
        titles: Vec<String>,
        filters: FilterCriteria,
    },
    Analysis(Vec<String>),
    Mentions(String),
    Content(String),
    Agent(String),
    Insight {
        titles: Vec<String>,
        kind: InsightKind,
    },
}

/// Builder pattern: `.on_articles()`, `.on_network()`, `.on_mentions()`, ...
/// Unregistered lookups return `Err`. `.failing(resource)` forces every call
/// for that resource to fail; `.delayed(resource, d)` queues a delay consumed
/// by the next call for that resource. Both have `&self` forms for use after
/// the mock is shared.
#[derive(Default)]
pub struct MockApi {
    articles: Option<Vec<ArticleSummary>>,
    sectors: Option<Vec<String>>,
    networks: HashMap<Vec<String>, GraphSnapshot>,
    analyses: HashMap<Vec<String>, CompanyAnalysis>,
    mentions: HashMap<String, Vec<NodeId>>,
    contents: HashMap<String, String>,
    answers: HashMap<String, AgentAnswer>,
    insights: HashMap<InsightKind, String>,
    failing: Mutex<HashSet<Resource>>,
    delays: Mutex<HashMap<Resource, VecDeque<Duration>>>,
    calls: Mutex<Vec<ApiCall>>,
}

fn key(titles: &[&str]) -> Vec<String> {
    titles.iter().map(|t| t.to_string()).collect()
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_articles(mut self, articles: Vec<ArticleSummary>) -> Self {
        self.articles = Some(articles);
        self
    }

    pub fn on_sectors(mut self, sectors: &[&str]) -> Self {
        self.sectors = Some(key(sectors));
        self
    }

    pub fn on_network(mut self, titles: &[&str], snapshot: GraphSnapshot) -> Self {
        self.networks.insert(key(titles), snapshot);
        self
    }

    pub fn on_analysis(mut self, titles: &[&str], analysis: CompanyAnalysis) -> Self {
        self.analyses.insert(key(titles), analysis);
        self
    }

    pub fn on_mentions(mut self, title: &str, ids: &[&str]) -> Self {
        self.mentions
            .insert(title.to_string(), ids.iter().map(|id| NodeId::from(*id)).collect());
        self
    }

    pub fn on_content(mut self, title: &str, text: &str) -> Self {
        self.contents.insert(title.to_string(), text.to_string());
        self
    }

    pub fn on_agent(mut self, question: &str, answer: AgentAnswer) -> Self {
        self.answers.insert(question.to_string(), answer);
        self
    }

    pub fn on_insight(mut self, kind: InsightKind, markdown: &str) -> Self {
        self.insights.insert(kind, markdown.to_string());
        self
    }

    pub fn failing(self, resource: Resource) -> Self {
        self.set_failing(resource, true);
        self
    }

    pub fn delayed(self, resource: Resource, delay: Duration) -> Self {
        self.delay_next(resource, delay);
        self
    }

    /// Start or stop failing calls for `resource` on a live mock.
    pub fn set_failing(&self, resource: Resource, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(resource);
        } else {
            set.remove(&resource);
        }
    }

    /// Queue a delay for the next not-yet-delayed call for `resource`.
    pub fn delay_next(&self, resource: Resource, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .entry(resource)
            .or_default()
            .push_back(delay);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&ApiCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(*c)).count()
    }

    async fn enter(&self, resource: Resource, call: ApiCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        let delay = self
            .delays
            .lock()
            .unwrap()
            .get_mut(&resource)
            .and_then(VecDeque::pop_front);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(&resource) {
            bail!("MockApi: {resource} is failing");
        }
        Ok(())
    }
}

#[async_trait]
impl ExplorerApi for MockApi {
    async fn articles(&self, filters: &FilterCriteria) -> Result<Vec<ArticleSummary>> {
        self.enter(Resource::Articles, ApiCall::Articles(filters.clone()))
            .await?;
        self.articles
            .clone()
            .ok_or_else(|| anyhow::anyhow!("MockApi: no articles registered"))
    }

    async fn sectors(&self) -> Result<Vec<String>> {
        self.enter(Resource::Sectors, ApiCall::Sectors).await?;
        self.sectors
            .clone()
            .ok_or_else(|| anyhow::anyhow!("MockApi: no sectors registered"))
    }

    async fn network(&self, titles: &[String], filters: &FilterCriteria) -> Result<GraphSnapshot> {
        self.enter(
            Resource::Graph,
            ApiCall::Network {
                titles: titles.to_vec(),
                filters: filters.clone(),
            },
        )
        .await?;
        self.networks
            .get(titles)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockApi: no network registered for {titles:?}"))
    }

    async fn company_analysis(&self, titles: &[String]) -> Result<CompanyAnalysis> {
        self.enter(Resource::Analysis, ApiCall::Analysis(titles.to_vec()))
            .await?;
        self.analyses
            .get(titles)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockApi: no analysis registered for {titles:?}"))
    }

    async fn article_mentions(&self, title: &str) -> Result<Vec<NodeId>> {
        self.enter(Resource::Mentions, ApiCall::Mentions(title.to_string()))
            .await?;
        self.mentions
            .get(title)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockApi: no mentions registered for {title}"))
    }

    async fn article_content(&self, title: &str) -> Result<ArticleContent> {
        self.enter(Resource::Content, ApiCall::Content(title.to_string()))
            .await?;
        self.contents
            .get(title)
            .map(|text| ArticleContent { text: text.clone() })
            .ok_or_else(|| anyhow::anyhow!("MockApi: no content registered for {title}"))
    }

    async fn agent_query(&self, question: &str) -> Result<AgentAnswer> {
        self.enter(Resource::AgentQuery, ApiCall::Agent(question.to_string()))
            .await?;
        self.answers
            .get(question)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockApi: no answer registered for {question}"))
    }

    async fn agent_insight(&self, titles: &[String], kind: InsightKind) -> Result<String> {
        self.enter(
            Resource::Insight,
            ApiCall::Insight {
                titles: titles.to_vec(),
                kind,
            },
        )
        .await?;
        self.insights
            .get(&kind)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockApi: no insight registered for {}", kind.as_str()))
    }
}

// ---------------------------------------------------------------------------
// FakeLayout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum CameraMove {
    CenterAt(Point, Duration),
    Zoom(f64, Duration),
}

/// Static layout. Positions come from `.with_position()` or, failing that,
/// from node seeds at load time. Zooming applies instantly.
#[derive(Debug)]
pub struct FakeLayout {
    positions: HashMap<NodeId, Point>,
    nodes: Vec<LayoutNode>,
    links: Vec<LayoutLink>,
    reheats: usize,
    camera: Vec<CameraMove>,
    scale: f64,
}

impl Default for FakeLayout {
    fn default() -> Self {
        Self {
            positions: HashMap::new(),
            nodes: Vec::new(),
            links: Vec::new(),
            reheats: 0,
            camera: Vec::new(),
            scale: 1.0,
        }
    }
}

impl FakeLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, id: &str, at: Point) -> Self {
        self.positions.insert(id.into(), at);
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn loaded_nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn loaded_links(&self) -> &[LayoutLink] {
        &self.links
    }

    pub fn reheats(&self) -> usize {
        self.reheats
    }

    pub fn camera_moves(&self) -> &[CameraMove] {
        &self.camera
    }
}

impl Layout for FakeLayout {
    fn load(&mut self, nodes: Vec<LayoutNode>, links: Vec<LayoutLink>) {
        for node in &nodes {
            if let Some(seed) = node.seed {
                self.positions.entry(node.id.clone()).or_insert(seed);
            }
        }
        self.nodes = nodes;
        self.links = links;
    }

    fn position(&self, id: &str) -> Option<Point> {
        self.positions.get(id).copied()
    }

    fn reheat(&mut self) {
        self.reheats += 1;
    }

    fn center_at(&mut self, at: Point, duration: Duration) {
        self.camera.push(CameraMove::CenterAt(at, duration));
    }

    fn zoom(&mut self, level: f64, duration: Duration) {
        self.camera.push(CameraMove::Zoom(level, duration));
        self.scale = level;
    }

    fn scale(&self) -> f64 {
        self.scale
    }
}

// ---------------------------------------------------------------------------
// RecordingCanvas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear(String),
    FillCircle {
        center: Point,
        radius: f64,
        color: String,
    },
    StrokeCircle {
        center: Point,
        radius: f64,
        line_width: f64,
        color: String,
    },
    Line {
        from: Point,
        to: Point,
        line_width: f64,
        color: String,
    },
    FillRect {
        origin: Point,
        width: f64,
        height: f64,
        color: String,
    },
    Text {
        text: String,
        at: Point,
        font_size: f64,
        color: String,
    },
}

/// Width per character, as a fraction of the font size.
const GLYPH_WIDTH: f64 = 0.6;

#[derive(Debug, Default)]
pub struct RecordingCanvas {
    ops: Vec<DrawOp>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Text strings in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Fill color of the circle drawn at `center`, if any.
    pub fn fill_at(&self, center: Point) -> Option<&str> {
        self.ops.iter().find_map(|op| match op {
            DrawOp::FillCircle {
                center: c, color, ..
            } if *c == center => Some(color.as_str()),
            _ => None,
        })
    }
}

impl Canvas for RecordingCanvas {
    fn clear(&mut self, color: &str) {
        self.ops.push(DrawOp::Clear(color.to_string()));
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: &str) {
        self.ops.push(DrawOp::FillCircle {
            center,
            radius,
            color: color.to_string(),
        });
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, line_width: f64, color: &str) {
        self.ops.push(DrawOp::StrokeCircle {
            center,
            radius,
            line_width,
            color: color.to_string(),
        });
    }

    fn line(&mut self, from: Point, to: Point, line_width: f64, color: &str) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            line_width,
            color: color.to_string(),
        });
    }

    fn fill_rect(&mut self, origin: Point, width: f64, height: f64, color: &str) {
        self.ops.push(DrawOp::FillRect {
            origin,
            width,
            height,
            color: color.to_string(),
        });
    }

    fn text(&mut self, text: &str, at: Point, font_size: f64, color: &str) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            at,
            font_size,
            color: color.to_string(),
        });
    }

    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * GLYPH_WIDTH
    }
}
