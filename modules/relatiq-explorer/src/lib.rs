//! Interactive graph-exploration engine.
//!
//! A `Session` ties together fetch orchestration over the knowledge-graph
//! API, the highlight model, reading mode and the graph renderer. Hosts feed
//! it `UserAction`s, drive `next_event`, and call `renderer().draw()` each
//! frame.

pub mod highlight;
pub mod orchestrator;
pub mod reading;
pub mod render;
pub mod session;
pub mod state;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use highlight::{edge_emphasis, node_emphasis, Emphasis, HighlightEngine};
pub use orchestrator::{decide_fetches, FetchIntent, QueryOrchestrator, Resource, Ticket, ViewState};
pub use reading::{ReadingState, ReadingTraversal};
pub use render::{Canvas, FrameStats, GraphRenderer, Layout, Palette};
pub use session::{connect, Session, SessionEvent, UserAction};
pub use state::{ExplorerState, FetchFailure};
pub use traits::ExplorerApi;
