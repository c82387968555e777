//! Shared setup for the session integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use relatiq_common::ThemeSlot;
use relatiq_explorer::testing::{article, snapshot, FakeLayout, MockApi};
use relatiq_explorer::Session;

pub const QUIET: Duration = Duration::from_millis(300);

pub struct Harness {
    pub api: Arc<MockApi>,
    pub session: Session<MockApi, FakeLayout>,
    pub prefs: TempDir,
}

impl Harness {
    pub fn preferences_path(&self) -> std::path::PathBuf {
        self.prefs.path().join("preferences.json")
    }
}

/// Articles `X`, `Y`, two sectors, and a three-node default graph.
pub fn base_api() -> MockApi {
    MockApi::new()
        .on_articles(vec![article("X"), article("Y")])
        .on_sectors(&["AI", "Semiconductors"])
        .on_network(&[], snapshot(&["n1", "n2", "n3"]))
}

/// A started session with the opening fetches already applied.
pub async fn started(api: MockApi) -> Harness {
    started_with(api, FakeLayout::new()).await
}

pub async fn started_with(api: MockApi, layout: FakeLayout) -> Harness {
    let prefs = tempfile::tempdir().unwrap();
    let api = Arc::new(api);
    let mut session = Session::new(
        api.clone(),
        layout,
        ThemeSlot::init(prefs.path().join("preferences.json")),
        QUIET,
    );
    session.start();
    session.settle().await;
    Harness {
        api,
        session,
        prefs,
    }
}

pub fn node_ids(session: &Session<MockApi, FakeLayout>) -> Vec<&str> {
    session
        .state()
        .graph
        .nodes
        .iter()
        .map(|n| n.id.as_str())
        .collect()
}
