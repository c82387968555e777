use std::time::Duration;

use relatiq_common::{GraphSnapshot, NodeId, Point};

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: NodeId,
    pub seed: Option<Point>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutLink {
    pub source: NodeId,
    pub target: NodeId,
}

/// The force-layout collaborator. It owns live node positions and the camera.
pub trait Layout {
    /// Replace the simulated graph.
    fn load(&mut self, nodes: Vec<LayoutNode>, links: Vec<LayoutLink>);

    fn position(&self, id: &str) -> Option<Point>;

    fn reheat(&mut self);

    fn center_at(&mut self, at: Point, duration: Duration);

    fn zoom(&mut self, level: f64, duration: Duration);

    /// Current zoom scale; 1.0 is unzoomed.
    fn scale(&self) -> f64;
}

/// Nodes and links for `snapshot`. Links with a missing endpoint are left out
/// so the layout never sees a dangling reference.
pub fn layout_input(snapshot: &GraphSnapshot) -> (Vec<LayoutNode>, Vec<LayoutLink>) {
    let nodes = snapshot
        .nodes
        .iter()
        .map(|n| LayoutNode {
            id: n.id.clone(),
            seed: n.position,
        })
        .collect();
    let links = snapshot
        .drawable_edges()
        .map(|e| LayoutLink {
            source: e.source.clone(),
            target: e.target.clone(),
        })
        .collect();
    (nodes, links)
}
