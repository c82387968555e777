//! Graph renderer.
//!
//! Per-frame drawing over a `Layout` that owns node positions and the camera.
//! The visual rules live in two pure functions, `node_visual` and
//! `edge_visual`; `GraphRenderer::draw` only walks the snapshot and hands
//! their output to a `Canvas`.

pub mod canvas;
pub mod layout;
pub mod palette;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use relatiq_common::{GraphEdge, GraphNode, GraphSnapshot, HighlightSet, NodeId, Point, Theme};

use crate::highlight::{edge_emphasis, node_emphasis, Emphasis};

pub use canvas::Canvas;
pub use layout::{layout_input, Layout, LayoutLink, LayoutNode};
pub use palette::Palette;

pub const NODE_RADIUS: f64 = 5.0;
pub const DIM_NODE_RADIUS: f64 = 3.0;
pub const HALO_RADIUS: f64 = 8.0;
/// Above this zoom scale every node is labelled.
pub const LABEL_ZOOM_THRESHOLD: f64 = 2.0;

const NODE_FONT_SIZE: f64 = 12.0;
const DIM_NODE_FONT_SIZE: f64 = 10.0;
const LABEL_OFFSET: f64 = 8.0;
const DIM_LABEL_OFFSET: f64 = 6.0;
const EDGE_FONT_SIZE: f64 = 10.0;
const LABEL_PATCH_PADDING: f64 = 1.0;

pub const FOCUS_ZOOM: f64 = 8.0;
pub const FOCUS_PAN_DURATION: Duration = Duration::from_millis(1000);
pub const FOCUS_ZOOM_DURATION: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Halo<'a> {
    pub radius: f64,
    pub line_width: f64,
    pub color: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeLabel<'a> {
    pub text: &'a str,
    /// Drawn this far below the node center.
    pub offset: f64,
    pub font_size: f64,
    pub color: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeVisual<'a> {
    pub emphasis: Emphasis,
    pub radius: f64,
    pub fill: &'a str,
    pub halo: Option<Halo<'a>>,
    pub label: Option<NodeLabel<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeLabel<'a> {
    pub text: &'a str,
    pub font_size: f64,
    pub color: &'a str,
    pub patch: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeVisual<'a> {
    pub emphasis: Emphasis,
    pub color: &'a str,
    pub line_width: f64,
    pub label: Option<EdgeLabel<'a>>,
}

/// Zoom scales that would blow up divisions are treated as unzoomed.
fn effective_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

pub fn node_visual<'a>(
    node: &'a GraphNode,
    highlight: &HighlightSet,
    scale: f64,
    palette: &'a Palette,
) -> NodeVisual<'a> {
    let scale = effective_scale(scale);
    let emphasis = node_emphasis(highlight, node.id.as_str());
    let dimmed = emphasis.is_dimmed();

    let halo = emphasis.is_highlighted().then(|| Halo {
        radius: HALO_RADIUS,
        line_width: 1.0 / scale,
        color: node.color.as_str(),
    });

    let labelled = emphasis.is_highlighted() || scale > LABEL_ZOOM_THRESHOLD;
    let label = labelled.then(|| NodeLabel {
        text: node.label.as_str(),
        offset: if dimmed { DIM_LABEL_OFFSET } else { LABEL_OFFSET },
        font_size: (if dimmed { DIM_NODE_FONT_SIZE } else { NODE_FONT_SIZE }) / scale,
        color: if dimmed { palette.dim_text } else { palette.text },
    });

    NodeVisual {
        emphasis,
        radius: if dimmed { DIM_NODE_RADIUS } else { NODE_RADIUS },
        fill: if dimmed { palette.dim_node } else { node.color.as_str() },
        halo,
        label,
    }
}

pub fn edge_visual<'a>(
    edge: &'a GraphEdge,
    highlight: &HighlightSet,
    scale: f64,
    palette: &'a Palette,
) -> EdgeVisual<'a> {
    let scale = effective_scale(scale);
    let emphasis = edge_emphasis(highlight, edge.source.as_str(), edge.target.as_str());
    let dimmed = emphasis.is_dimmed();

    let label = edge.visible_label().filter(|_| !dimmed).map(|text| EdgeLabel {
        text,
        font_size: EDGE_FONT_SIZE / scale,
        color: palette.edge_label,
        patch: palette.label_patch,
    });

    EdgeVisual {
        emphasis,
        color: if dimmed { palette.dim_edge } else { palette.edge },
        line_width: 1.0 / scale,
        label,
    }
}

/// What one `draw` call actually put on the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub nodes: usize,
    pub edges: usize,
    pub labels: usize,
    /// Elements left out because a position was missing or not finite.
    pub skipped: usize,
}

pub struct GraphRenderer<L: Layout> {
    layout: L,
    snapshot: Arc<GraphSnapshot>,
    /// Position of each node id in `snapshot.nodes`, rebuilt with the snapshot.
    index: HashMap<NodeId, usize>,
    highlight: HighlightSet,
    theme: Theme,
}

fn index_nodes(snapshot: &GraphSnapshot) -> HashMap<NodeId, usize> {
    let mut index = HashMap::with_capacity(snapshot.nodes.len());
    for (i, node) in snapshot.nodes.iter().enumerate() {
        index.entry(node.id.clone()).or_insert(i);
    }
    index
}

impl<L: Layout> GraphRenderer<L> {
    pub fn new(layout: L, theme: Theme) -> Self {
        Self {
            layout,
            snapshot: Arc::new(GraphSnapshot::default()),
            index: HashMap::new(),
            highlight: HighlightSet::empty(),
            theme,
        }
    }

    pub fn snapshot(&self) -> &Arc<GraphSnapshot> {
        &self.snapshot
    }

    pub fn highlight(&self) -> &HighlightSet {
        &self.highlight
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut L {
        &mut self.layout
    }

    /// Hand a new snapshot to the layout. Re-setting the same snapshot is a
    /// no-op.
    pub fn set_snapshot(&mut self, snapshot: Arc<GraphSnapshot>) {
        if Arc::ptr_eq(&self.snapshot, &snapshot) {
            return;
        }
        let (nodes, links) = layout_input(&snapshot);
        debug!(nodes = nodes.len(), links = links.len(), "Loading graph into layout");
        self.layout.load(nodes, links);
        self.index = index_nodes(&snapshot);
        self.snapshot = snapshot;
        self.layout.reheat();
    }

    pub fn set_highlight(&mut self, highlight: HighlightSet) {
        if self.highlight == highlight {
            return;
        }
        self.highlight = highlight;
        self.layout.reheat();
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if self.theme == theme {
            return;
        }
        self.theme = theme;
        self.layout.reheat();
    }

    fn position_of(&self, node: &GraphNode) -> Option<Point> {
        self.layout
            .position(node.id.as_str())
            .or(node.position)
            .filter(|p| p.x.is_finite() && p.y.is_finite())
    }

    fn node_by_id(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).and_then(|&i| self.snapshot.nodes.get(i))
    }

    fn position_by_id(&self, id: &str) -> Option<Point> {
        self.node_by_id(id).and_then(|n| self.position_of(n))
    }

    /// Draw one frame: background, then edges, then nodes on top.
    pub fn draw<C: Canvas>(&self, canvas: &mut C) -> FrameStats {
        let palette = Palette::for_theme(self.theme);
        let scale = self.layout.scale();
        let mut stats = FrameStats::default();

        canvas.clear(palette.background);

        for edge in &self.snapshot.edges {
            let (Some(source), Some(target)) = (
                self.node_by_id(edge.source.as_str()),
                self.node_by_id(edge.target.as_str()),
            ) else {
                // Dangling edges are never part of the drawn graph.
                continue;
            };
            let (Some(from), Some(to)) = (self.position_of(source), self.position_of(target)) else {
                stats.skipped += 1;
                continue;
            };
            let visual = edge_visual(edge, &self.highlight, scale, palette);
            canvas.line(from, to, visual.line_width, visual.color);
            stats.edges += 1;

            if let Some(label) = visual.label {
                let mid = from.midpoint(to);
                let width = canvas.measure_text(label.text, label.font_size);
                canvas.fill_rect(
                    Point::new(
                        mid.x - width / 2.0 - LABEL_PATCH_PADDING,
                        mid.y - label.font_size / 2.0 - LABEL_PATCH_PADDING,
                    ),
                    width + 2.0 * LABEL_PATCH_PADDING,
                    label.font_size + 2.0 * LABEL_PATCH_PADDING,
                    label.patch,
                );
                canvas.text(label.text, mid, label.font_size, label.color);
                stats.labels += 1;
            }
        }

        for node in &self.snapshot.nodes {
            let Some(at) = self.position_of(node) else {
                stats.skipped += 1;
                continue;
            };
            let visual = node_visual(node, &self.highlight, scale, palette);
            canvas.fill_circle(at, visual.radius, visual.fill);
            if let Some(halo) = visual.halo {
                canvas.stroke_circle(at, halo.radius, halo.line_width, halo.color);
            }
            if let Some(label) = visual.label {
                canvas.text(
                    label.text,
                    Point::new(at.x, at.y + label.offset),
                    label.font_size,
                    label.color,
                );
                stats.labels += 1;
            }
            stats.nodes += 1;
        }

        trace!(?stats, "Frame drawn");
        stats
    }

    /// Center the camera on a node and zoom in. Returns false when the node
    /// is unknown or has no position yet.
    pub fn focus_node(&mut self, id: &str) -> bool {
        let Some(at) = self.position_by_id(id) else {
            debug!(node = id, "Focus requested for node without a position");
            return false;
        };
        self.layout.center_at(at, FOCUS_PAN_DURATION);
        self.layout.zoom(FOCUS_ZOOM, FOCUS_ZOOM_DURATION);
        true
    }

    /// The topmost node whose drawn circle contains `point`.
    pub fn node_at(&self, point: Point) -> Option<&NodeId> {
        let palette = Palette::for_theme(self.theme);
        let scale = self.layout.scale();
        self.snapshot.nodes.iter().rev().find_map(|node| {
            let at = self.position_of(node)?;
            let radius = node_visual(node, &self.highlight, scale, palette).radius;
            (at.distance(point) <= radius).then_some(&node.id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DrawOp, FakeLayout, RecordingCanvas};

    fn node(id: &str, color: &str) -> GraphNode {
        GraphNode {
            id: id.into(),
            label: id.to_uppercase(),
            color: color.into(),
            position: None,
        }
    }

    fn edge(source: &str, target: &str, label: Option<&str>) -> GraphEdge {
        GraphEdge {
            source: source.into(),
            target: target.into(),
            label: label.map(str::to_string),
        }
    }

    fn highlight(ids: &[&str]) -> HighlightSet {
        ids.iter().map(|id| NodeId::from(*id)).collect()
    }

    fn triangle() -> Arc<GraphSnapshot> {
        Arc::new(GraphSnapshot {
            nodes: vec![node("n1", "#e11d48"), node("n2", "#2563eb"), node("n3", "#16a34a")],
            edges: vec![
                edge("n1", "n3", Some("INVESTS_IN")),
                edge("n1", "n2", Some("COMPETES_WITH")),
                edge("n2", "ghost", None),
            ],
        })
    }

    fn positioned_layout() -> FakeLayout {
        FakeLayout::new()
            .with_position("n1", Point::new(0.0, 0.0))
            .with_position("n2", Point::new(20.0, 0.0))
            .with_position("n3", Point::new(0.0, 20.0))
    }

    // --- node_visual ---

    #[test]
    fn without_highlight_nodes_keep_their_color_and_have_no_halo() {
        let n = node("n1", "#e11d48");
        let v = node_visual(&n, &HighlightSet::empty(), 1.0, &palette::LIGHT);
        assert_eq!(v.fill, "#e11d48");
        assert_eq!(v.radius, NODE_RADIUS);
        assert!(v.halo.is_none());
        assert!(v.label.is_none());
    }

    #[test]
    fn highlighted_node_gets_halo_and_label() {
        let n = node("n1", "#e11d48");
        let v = node_visual(&n, &highlight(&["n1"]), 1.0, &palette::DARK);
        let halo = v.halo.expect("halo");
        assert_eq!(halo.radius, HALO_RADIUS);
        assert_eq!(halo.color, "#e11d48");
        let label = v.label.expect("label");
        assert_eq!(label.text, "N1");
        assert_eq!(label.color, palette::DARK.text);
    }

    #[test]
    fn dimmed_node_is_smaller_and_theme_colored() {
        let n = node("n2", "#2563eb");
        let v = node_visual(&n, &highlight(&["n1"]), 1.0, &palette::DARK);
        assert_eq!(v.radius, DIM_NODE_RADIUS);
        assert_eq!(v.fill, palette::DARK.dim_node);
        assert!(v.halo.is_none());
        assert!(v.label.is_none());
    }

    #[test]
    fn zooming_past_threshold_labels_everything() {
        let n = node("n2", "#2563eb");
        let v = node_visual(&n, &highlight(&["n1"]), 4.0, &palette::LIGHT);
        let label = v.label.expect("label when zoomed in");
        assert_eq!(label.font_size, DIM_NODE_FONT_SIZE / 4.0);
        assert_eq!(label.color, palette::LIGHT.dim_text);

        let at_threshold = node_visual(&n, &HighlightSet::empty(), LABEL_ZOOM_THRESHOLD, &palette::LIGHT);
        assert!(at_threshold.label.is_none());
    }

    #[test]
    fn degenerate_scale_is_treated_as_unzoomed() {
        let n = node("n1", "#e11d48");
        let v = node_visual(&n, &highlight(&["n1"]), 0.0, &palette::LIGHT);
        assert_eq!(v.halo.map(|h| h.line_width), Some(1.0));
    }

    // --- edge_visual ---

    #[test]
    fn edge_dims_unless_both_endpoints_highlighted() {
        let h = highlight(&["n1", "n3"]);
        let lit = edge("n1", "n3", Some("INVESTS_IN"));
        let dim = edge("n1", "n2", Some("COMPETES_WITH"));

        let lit_visual = edge_visual(&lit, &h, 1.0, &palette::LIGHT);
        assert_eq!(lit_visual.color, palette::LIGHT.edge);
        assert_eq!(lit_visual.label.map(|l| l.text), Some("INVESTS_IN"));

        let dim_visual = edge_visual(&dim, &h, 1.0, &palette::LIGHT);
        assert_eq!(dim_visual.color, palette::LIGHT.dim_edge);
        assert!(dim_visual.label.is_none());
    }

    #[test]
    fn blank_edge_label_is_not_drawn() {
        let e = edge("n1", "n2", Some("  "));
        assert!(edge_visual(&e, &HighlightSet::empty(), 1.0, &palette::LIGHT)
            .label
            .is_none());
    }

    // --- GraphRenderer ---

    #[test]
    fn draw_puts_edges_under_nodes_and_skips_dangling_edges() {
        let mut renderer = GraphRenderer::new(positioned_layout(), Theme::Light);
        renderer.set_snapshot(triangle());

        let mut canvas = RecordingCanvas::new();
        let stats = renderer.draw(&mut canvas);

        assert_eq!(stats.nodes, 3);
        assert_eq!(stats.edges, 2);
        assert_eq!(canvas.ops()[0], DrawOp::Clear("#ffffff".into()));

        let last_line = canvas
            .ops()
            .iter()
            .rposition(|op| matches!(op, DrawOp::Line { .. }))
            .unwrap();
        let first_circle = canvas
            .ops()
            .iter()
            .position(|op| matches!(op, DrawOp::FillCircle { .. }))
            .unwrap();
        assert!(last_line < first_circle);
    }

    #[test]
    fn dangling_edge_never_reaches_the_layout() {
        let mut renderer = GraphRenderer::new(FakeLayout::new(), Theme::Light);
        renderer.set_snapshot(triangle());
        assert_eq!(renderer.layout().loaded_links().len(), 2);
        assert_eq!(renderer.layout().loaded_nodes().len(), 3);
    }

    #[test]
    fn nodes_without_position_are_skipped() {
        let layout = FakeLayout::new().with_position("n1", Point::new(0.0, 0.0));
        let mut renderer = GraphRenderer::new(layout, Theme::Dark);
        renderer.set_snapshot(triangle());

        let stats = renderer.draw(&mut RecordingCanvas::new());
        assert_eq!(stats.nodes, 1);
        assert_eq!(stats.edges, 0);
        assert_eq!(stats.skipped, 4);
    }

    #[test]
    fn highlighted_draw_labels_only_the_highlighted_subgraph() {
        let mut renderer = GraphRenderer::new(positioned_layout(), Theme::Light);
        renderer.set_snapshot(triangle());
        renderer.set_highlight(highlight(&["n1", "n3"]));

        let mut canvas = RecordingCanvas::new();
        renderer.draw(&mut canvas);

        let texts: Vec<&str> = canvas.texts().collect();
        assert_eq!(texts, vec!["INVESTS_IN", "N1", "N3"]);
        assert_eq!(
            canvas
                .ops()
                .iter()
                .filter(|op| matches!(op, DrawOp::StrokeCircle { .. }))
                .count(),
            2
        );
        assert!(canvas
            .ops()
            .iter()
            .any(|op| matches!(op, DrawOp::FillRect { color, .. } if color == "#ffffff")));
    }

    #[test]
    fn replacing_the_snapshot_rebuilds_the_node_index() {
        let mut renderer = GraphRenderer::new(positioned_layout(), Theme::Light);
        renderer.set_snapshot(triangle());
        assert!(renderer.focus_node("n3"));

        let mut swapped = (*triangle()).clone();
        swapped.nodes.reverse();
        swapped.nodes.pop();
        renderer.set_snapshot(Arc::new(swapped));

        assert_eq!(renderer.node_by_id("n3").map(|n| n.color.as_str()), Some("#16a34a"));
        assert!(renderer.node_by_id("n1").is_none());
        assert!(!renderer.focus_node("n1"));

        let stats = renderer.draw(&mut RecordingCanvas::new());
        assert_eq!(stats.nodes, 2);
        assert_eq!(stats.edges, 0);
        assert_eq!(stats.skipped, 0);
    }

    #[test]
    fn changes_reheat_but_repeats_do_not() {
        let mut renderer = GraphRenderer::new(FakeLayout::new(), Theme::Light);
        let snapshot = triangle();
        renderer.set_snapshot(snapshot.clone());
        renderer.set_snapshot(snapshot);
        renderer.set_theme(Theme::Light);
        renderer.set_theme(Theme::Dark);
        renderer.set_highlight(HighlightSet::empty());
        renderer.set_highlight(highlight(&["n1"]));
        assert_eq!(renderer.layout().reheats(), 3);
    }

    #[test]
    fn focus_centers_then_zooms() {
        let mut renderer = GraphRenderer::new(positioned_layout(), Theme::Light);
        renderer.set_snapshot(triangle());

        assert!(renderer.focus_node("n2"));
        assert_eq!(
            renderer.layout().camera_moves(),
            &[
                crate::testing::CameraMove::CenterAt(Point::new(20.0, 0.0), FOCUS_PAN_DURATION),
                crate::testing::CameraMove::Zoom(FOCUS_ZOOM, FOCUS_ZOOM_DURATION),
            ]
        );
        assert!(!renderer.focus_node("ghost"));
        assert_eq!(renderer.layout().camera_moves().len(), 2);
    }

    #[test]
    fn node_at_hits_within_drawn_radius() {
        let mut renderer = GraphRenderer::new(positioned_layout(), Theme::Light);
        renderer.set_snapshot(triangle());

        assert_eq!(
            renderer.node_at(Point::new(19.0, 1.0)).map(NodeId::as_str),
            Some("n2")
        );
        assert!(renderer.node_at(Point::new(10.0, 10.0)).is_none());

        renderer.set_highlight(highlight(&["n1"]));
        // n2 is dimmed now and only 3 units wide.
        assert!(renderer.node_at(Point::new(16.0, 0.0)).is_none());
    }
}
