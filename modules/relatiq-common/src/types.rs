use std::borrow::Borrow;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

// --- Filter vocabulary ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateRange {
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl DateRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::SevenDays => "7d",
            DateRange::ThirtyDays => "30d",
            DateRange::ThreeMonths => "3m",
            DateRange::All => "all",
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editorial confidence class of a news source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    A,
    B,
    C,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NewsStatus {
    #[serde(rename = "Confirmed News")]
    Confirmed,
    #[serde(rename = "Rumor/Speculation")]
    Speculative,
    #[serde(rename = "Analysis/Outlook")]
    Analysis,
}

impl NewsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsStatus::Confirmed => "Confirmed News",
            NewsStatus::Speculative => "Rumor/Speculation",
            NewsStatus::Analysis => "Analysis/Outlook",
        }
    }
}

impl fmt::Display for NewsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The complete set of article filters. Edits replace the whole value; two
/// criteria are "the same query" exactly when they compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, TypedBuilder)]
pub struct FilterCriteria {
    #[builder(default)]
    pub date_range: DateRange,
    #[builder(default)]
    pub tiers: BTreeSet<Tier>,
    #[builder(default)]
    pub statuses: BTreeSet<NewsStatus>,
    #[builder(default)]
    pub sectors: BTreeSet<String>,
    #[builder(default, setter(into))]
    pub entity_search: String,
}

impl FilterCriteria {
    /// True when `other` differs from `self` in nothing but the free-text
    /// entity search.
    pub fn differs_only_in_search(&self, other: &FilterCriteria) -> bool {
        self.entity_search != other.entity_search
            && self.date_range == other.date_range
            && self.tiers == other.tiers
            && self.statuses == other.statuses
            && self.sectors == other.sectors
    }

    pub fn with_date_range(&self, date_range: DateRange) -> Self {
        Self {
            date_range,
            ..self.clone()
        }
    }

    pub fn with_entity_search(&self, entity_search: impl Into<String>) -> Self {
        Self {
            entity_search: entity_search.into(),
            ..self.clone()
        }
    }

    pub fn toggling_tier(&self, tier: Tier) -> Self {
        let mut next = self.clone();
        if !next.tiers.remove(&tier) {
            next.tiers.insert(tier);
        }
        next
    }

    pub fn toggling_status(&self, status: NewsStatus) -> Self {
        let mut next = self.clone();
        if !next.statuses.remove(&status) {
            next.statuses.insert(status);
        }
        next
    }

    pub fn toggling_sector(&self, sector: &str) -> Self {
        let mut next = self.clone();
        if !next.sectors.remove(sector) {
            next.sectors.insert(sector.to_string());
        }
        next
    }
}

// --- Articles ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleContent {
    pub text: String,
}

// --- Graph model ---

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A position in graph (world) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new(
            self.x + (other.x - self.x) / 2.0,
            self.y + (other.y - self.y) / 2.0,
        )
    }

    pub fn distance(self, other: Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub label: String,
    pub color: String,
    /// Seed position. The layout owns live positions once the node is loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub label: Option<String>,
}

impl GraphEdge {
    /// Relationship label, if it has any visible text.
    pub fn visible_label(&self) -> Option<&str> {
        self.label.as_deref().filter(|l| !l.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl GraphSnapshot {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }

    /// Drop repeated node ids (first occurrence wins) so the id-unique
    /// invariant holds for everything downstream.
    pub fn normalized(mut self) -> Self {
        let mut seen: HashSet<NodeId> = HashSet::with_capacity(self.nodes.len());
        let before = self.nodes.len();
        self.nodes.retain(|n| seen.insert(n.id.clone()));
        let dropped = before - self.nodes.len();
        if dropped > 0 {
            tracing::warn!(dropped, "Graph payload repeated node ids, keeping first occurrence");
        }
        self
    }

    /// Edges whose endpoints are both present in the node set.
    pub fn drawable_edges(&self) -> impl Iterator<Item = &GraphEdge> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges
            .iter()
            .filter(move |e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
    }
}

/// Node ids to emphasise on the graph. The empty set means highlighting is
/// off and everything renders normally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightSet(BTreeSet<NodeId>);

impl HighlightSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.0.iter()
    }
}

impl FromIterator<NodeId> for HighlightSet {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<NodeId>> for HighlightSet {
    fn from(ids: Vec<NodeId>) -> Self {
        ids.into_iter().collect()
    }
}

// --- Selection ---

/// Selected article titles in the order the user picked them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionList(Vec<String>);

impl SelectionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `title` if absent, remove it if present. Returns whether the title
    /// is selected afterwards.
    pub fn toggle(&mut self, title: &str) -> bool {
        if let Some(pos) = self.0.iter().position(|t| t == title) {
            self.0.remove(pos);
            false
        } else {
            self.0.push(title.to_string());
            true
        }
    }

    pub fn contains(&self, title: &str) -> bool {
        self.0.iter().any(|t| t == title)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn titles(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for SelectionList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = SelectionList::new();
        for title in iter {
            let title = title.into();
            if !list.contains(&title) {
                list.0.push(title);
            }
        }
        list
    }
}

// --- View ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ActiveTab {
    #[default]
    Graph,
    Analysis,
    Agent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    DateRange,
    Tiers,
    Statuses,
    Sectors,
    EntitySearch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ViewMode {
    #[default]
    Selection,
    Analysis,
}

impl ViewMode {
    pub fn tabs(&self) -> &'static [ActiveTab] {
        match self {
            ViewMode::Selection => &[ActiveTab::Graph, ActiveTab::Agent],
            ViewMode::Analysis => &[ActiveTab::Analysis, ActiveTab::Agent],
        }
    }

    pub fn filters(&self) -> &'static [FilterField] {
        match self {
            ViewMode::Selection => &[
                FilterField::DateRange,
                FilterField::Tiers,
                FilterField::Statuses,
                FilterField::Sectors,
                FilterField::EntitySearch,
            ],
            ViewMode::Analysis => &[
                FilterField::DateRange,
                FilterField::Sectors,
                FilterField::EntitySearch,
            ],
        }
    }

    pub fn permits(&self, tab: ActiveTab) -> bool {
        self.tabs().contains(&tab)
    }

    /// The mode a tab lives in. The agent tab is reachable from both modes,
    /// so it keeps whatever mode is current.
    pub fn for_tab(tab: ActiveTab, current: ViewMode) -> ViewMode {
        match tab {
            ActiveTab::Graph => ViewMode::Selection,
            ActiveTab::Analysis => ViewMode::Analysis,
            ActiveTab::Agent => current,
        }
    }

    pub fn default_tab(&self) -> ActiveTab {
        self.tabs()[0]
    }
}

// --- Analysis & agent payloads ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsightKind {
    #[default]
    Summary,
    Risks,
    Direction,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::Summary => "Summary",
            InsightKind::Risks => "Risks",
            InsightKind::Direction => "Direction",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyMention {
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Article")]
    pub article: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyConnection {
    #[serde(rename = "Company1")]
    pub company_a: String,
    #[serde(rename = "Company2")]
    pub company_b: String,
    #[serde(rename = "Relationships", default)]
    pub relationships: Vec<String>,
    #[serde(rename = "Distance")]
    pub distance: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySentiment {
    pub entity_name: String,
    pub sentiment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyAnalysis {
    #[serde(default)]
    pub companies: Vec<CompanyMention>,
    #[serde(default)]
    pub connections: Vec<CompanyConnection>,
    #[serde(default)]
    pub sentiment: Option<Vec<EntitySentiment>>,
}

/// Answer to a free-form agent question: the generated graph query, its raw
/// rows, and whatever graph fragment could be recovered from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentAnswer {
    pub cypher: String,
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub graph: GraphSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> GraphNode {
        GraphNode {
            id: NodeId::from(id),
            label: id.to_uppercase(),
            color: "#ff0000".into(),
            position: None,
        }
    }

    fn edge(source: &str, target: &str) -> GraphEdge {
        GraphEdge {
            source: source.into(),
            target: target.into(),
            label: Some("PARTNERS_WITH".into()),
        }
    }

    // --- SelectionList ---

    #[test]
    fn toggle_twice_restores_membership_and_order() {
        let mut list: SelectionList = ["a", "b", "c"].into_iter().collect();
        let original = list.clone();

        assert!(!list.toggle("b"));
        assert_eq!(list.titles(), &["a".to_string(), "c".to_string()]);
        assert!(list.toggle("b"));
        assert_eq!(list.len(), 3);

        // "b" moved to the end but everyone else kept their relative order.
        let others: Vec<_> = list.titles().iter().filter(|t| *t != "b").collect();
        let original_others: Vec<_> = original.titles().iter().filter(|t| *t != "b").collect();
        assert_eq!(others, original_others);
    }

    #[test]
    fn toggle_of_new_title_appends() {
        let mut list = SelectionList::new();
        assert!(list.toggle("Doc1"));
        assert!(list.toggle("Doc2"));
        assert_eq!(list.get(0), Some("Doc1"));
        assert_eq!(list.get(1), Some("Doc2"));
    }

    #[test]
    fn collecting_drops_duplicates() {
        let list: SelectionList = ["x", "y", "x"].into_iter().collect();
        assert_eq!(list.len(), 2);
    }

    // --- FilterCriteria ---

    #[test]
    fn search_only_difference_is_detected() {
        let base = FilterCriteria::builder().date_range(DateRange::ThirtyDays).build();
        let typed = base.with_entity_search("Nvid");
        assert!(base.differs_only_in_search(&typed));

        let retiered = typed.toggling_tier(Tier::A);
        assert!(!typed.differs_only_in_search(&retiered));
        assert!(!base.differs_only_in_search(&base));
    }

    #[test]
    fn toggling_tier_twice_is_identity() {
        let base = FilterCriteria::default();
        assert_eq!(base.toggling_tier(Tier::B).toggling_tier(Tier::B), base);
    }

    #[test]
    fn wire_names_match_backend_vocabulary() {
        assert_eq!(serde_json::to_value(DateRange::ThreeMonths).unwrap(), "3m");
        assert_eq!(
            serde_json::to_value(NewsStatus::Analysis).unwrap(),
            "Analysis/Outlook"
        );
        assert_eq!(NewsStatus::Confirmed.as_str(), "Confirmed News");
        assert_eq!(Tier::C.to_string(), "C");
    }

    // --- GraphSnapshot ---

    #[test]
    fn normalized_keeps_first_of_repeated_ids() {
        let mut dup = node("n1");
        dup.label = "second".into();
        let snap = GraphSnapshot {
            nodes: vec![node("n1"), node("n2"), dup],
            edges: vec![],
        }
        .normalized();

        assert_eq!(snap.nodes.len(), 2);
        assert_eq!(snap.node("n1").unwrap().label, "N1");
    }

    #[test]
    fn drawable_edges_skip_missing_endpoints() {
        let snap = GraphSnapshot {
            nodes: vec![node("n1"), node("n2")],
            edges: vec![edge("n1", "n2"), edge("n1", "ghost")],
        };
        let drawable: Vec<_> = snap.drawable_edges().collect();
        assert_eq!(drawable.len(), 1);
        assert_eq!(drawable[0].target.as_str(), "n2");
    }

    #[test]
    fn snapshot_decodes_without_edge_labels() {
        let snap: GraphSnapshot = serde_json::from_str(
            r##"{"nodes":[{"id":"4:a","label":"OpenAI","color":"#ff0000"}],
                "edges":[{"source":"4:a","target":"4:a"}]}"##,
        )
        .unwrap();
        assert_eq!(snap.nodes[0].id.as_str(), "4:a");
        assert!(snap.edges[0].visible_label().is_none());
    }

    // --- HighlightSet ---

    #[test]
    fn empty_highlight_is_inactive() {
        assert!(!HighlightSet::empty().is_active());
        let h: HighlightSet = vec![NodeId::from("n1")].into();
        assert!(h.is_active());
        assert!(h.contains("n1"));
        assert!(!h.contains("n2"));
    }

    // --- ViewMode ---

    #[test]
    fn view_modes_gate_tabs() {
        assert!(ViewMode::Selection.permits(ActiveTab::Graph));
        assert!(!ViewMode::Selection.permits(ActiveTab::Analysis));
        assert!(ViewMode::Analysis.permits(ActiveTab::Agent));
        assert_eq!(
            ViewMode::for_tab(ActiveTab::Agent, ViewMode::Analysis),
            ViewMode::Analysis
        );
        assert!(!ViewMode::Analysis.filters().contains(&FilterField::Tiers));
    }

    #[test]
    fn analysis_payload_decodes_backend_column_names() {
        let analysis: CompanyAnalysis = serde_json::from_str(
            r#"{"companies":[{"Company":"Nvidia","Article":"Doc1"}],
                "connections":[{"Company1":"Nvidia","Company2":"OpenAI",
                                "Relationships":["INVESTS_IN"],"Distance":1}]}"#,
        )
        .unwrap();
        assert_eq!(analysis.companies[0].company, "Nvidia");
        assert_eq!(analysis.connections[0].relationships, vec!["INVESTS_IN"]);
        assert!(analysis.sentiment.is_none());
    }
}
