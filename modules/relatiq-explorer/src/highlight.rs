//! Highlight model.
//!
//! A `HighlightSet` comes from the mentions lookup for one article. The
//! emphasis functions here are the only place that decides what "dimmed"
//! means; the renderer just asks.

use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, warn};

use relatiq_common::{HighlightSet, NodeId};

use crate::traits::ExplorerApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    /// Highlighting is off; draw as-is.
    Neutral,
    Highlighted,
    Dimmed,
}

impl Emphasis {
    pub fn is_dimmed(self) -> bool {
        self == Emphasis::Dimmed
    }

    pub fn is_highlighted(self) -> bool {
        self == Emphasis::Highlighted
    }
}

pub fn node_emphasis(highlight: &HighlightSet, id: &str) -> Emphasis {
    if !highlight.is_active() {
        Emphasis::Neutral
    } else if highlight.contains(id) {
        Emphasis::Highlighted
    } else {
        Emphasis::Dimmed
    }
}

/// An edge stays lit only when both of its endpoints are highlighted.
pub fn edge_emphasis(highlight: &HighlightSet, source: &str, target: &str) -> Emphasis {
    if !highlight.is_active() {
        Emphasis::Neutral
    } else if highlight.contains(source) && highlight.contains(target) {
        Emphasis::Highlighted
    } else {
        Emphasis::Dimmed
    }
}

/// Resolves article titles to highlight sets, remembering answers for the
/// lifetime of the current selection.
#[derive(Debug, Default)]
pub struct HighlightEngine {
    cache: HashMap<String, HighlightSet>,
}

impl HighlightEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highlight set for `title`. A failed lookup yields the empty set, which
    /// turns highlighting off rather than hiding everything.
    pub async fn compute_highlight(&mut self, api: &dyn ExplorerApi, title: &str) -> HighlightSet {
        if let Some(hit) = self.cached(title) {
            return hit.clone();
        }
        let result = api.article_mentions(title).await;
        self.resolve(title, result)
    }

    pub fn cached(&self, title: &str) -> Option<&HighlightSet> {
        self.cache.get(title)
    }

    /// Turn a mentions lookup result into a highlight set. Successful results
    /// are cached; failures are not, so the next visit retries.
    pub fn resolve(&mut self, title: &str, result: Result<Vec<NodeId>>) -> HighlightSet {
        match result {
            Ok(ids) => {
                let set: HighlightSet = ids.into();
                debug!(title, mentions = set.len(), "Mentions resolved");
                self.cache.insert(title.to_string(), set.clone());
                set
            }
            Err(e) => {
                warn!(title, error = %e, "Mentions lookup failed, clearing highlight");
                HighlightSet::empty()
            }
        }
    }

    /// Forget cached answers. Called whenever the selection changes.
    pub fn reset_cache(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ApiCall, MockApi};

    fn set(ids: &[&str]) -> HighlightSet {
        ids.iter().map(|id| NodeId::from(*id)).collect()
    }

    #[test]
    fn empty_set_leaves_everything_neutral() {
        let h = HighlightSet::empty();
        assert_eq!(node_emphasis(&h, "n1"), Emphasis::Neutral);
        assert_eq!(edge_emphasis(&h, "n1", "n2"), Emphasis::Neutral);
    }

    #[test]
    fn nodes_outside_the_set_are_dimmed() {
        let h = set(&["n1", "n3"]);
        assert_eq!(node_emphasis(&h, "n1"), Emphasis::Highlighted);
        assert_eq!(node_emphasis(&h, "n3"), Emphasis::Highlighted);
        assert!(node_emphasis(&h, "n2").is_dimmed());
    }

    #[test]
    fn edge_needs_both_endpoints() {
        let h = set(&["n1", "n3"]);
        assert_eq!(edge_emphasis(&h, "n1", "n3"), Emphasis::Highlighted);
        assert!(edge_emphasis(&h, "n1", "n2").is_dimmed());
        assert!(edge_emphasis(&h, "n2", "n1").is_dimmed());
        assert!(edge_emphasis(&h, "n2", "n4").is_dimmed());
    }

    #[tokio::test]
    async fn compute_highlight_uses_mentions_and_caches() {
        let api = MockApi::new().on_mentions("Doc1", &["n1", "n3"]);
        let mut engine = HighlightEngine::new();

        let first = engine.compute_highlight(&api, "Doc1").await;
        let second = engine.compute_highlight(&api, "Doc1").await;

        assert_eq!(first, set(&["n1", "n3"]));
        assert_eq!(first, second);
        let lookups = api
            .calls()
            .into_iter()
            .filter(|c| matches!(c, ApiCall::Mentions(_)))
            .count();
        assert_eq!(lookups, 1);
    }

    #[tokio::test]
    async fn failed_lookup_turns_highlighting_off() {
        let api = MockApi::new().failing(crate::orchestrator::Resource::Mentions);
        let mut engine = HighlightEngine::new();

        let h = engine.compute_highlight(&api, "Doc1").await;
        assert!(!h.is_active());
        assert!(engine.cached("Doc1").is_none());
    }

    #[test]
    fn reset_cache_forgets_answers() {
        let mut engine = HighlightEngine::new();
        engine.resolve("Doc1", Ok(vec![NodeId::from("n1")]));
        assert!(engine.cached("Doc1").is_some());
        engine.reset_cache();
        assert!(engine.cached("Doc1").is_none());
    }
}
