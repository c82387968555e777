//! Session driver.
//!
//! Owns every piece of explorer state and is the only thing that writes to
//! it. User actions come in through `dispatch`; fetches run as spawned tasks
//! that report back over a channel, and `next_event` applies their results
//! one at a time after the orchestrator has vetted them.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use relatiq_client::RelatiqClient;
use relatiq_common::{
    ActiveTab, AgentAnswer, ArticleContent, ArticleSummary, CompanyAnalysis, Config,
    FilterCriteria, GraphSnapshot, HighlightSet, InsightKind, NodeId, Point, Theme, ThemeSlot,
    ViewMode,
};

use crate::highlight::HighlightEngine;
use crate::orchestrator::{QueryOrchestrator, Resource, Ticket, ViewState};
use crate::reading::ReadingTraversal;
use crate::render::{GraphRenderer, Layout};
use crate::state::{ExplorerState, FetchFailure};
use crate::traits::ExplorerApi;

#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    SetFilters(FilterCriteria),
    ToggleArticle(String),
    SelectTab(ActiveTab),
    SetViewMode(ViewMode),
    EnterReading,
    NextArticle,
    PrevArticle,
    ExitReading,
    SetTheme(Theme),
    ToggleTheme,
    AskAgent(String),
    GenerateInsight(InsightKind),
    /// Focus the camera on a node.
    ClickNode(NodeId),
    /// A raw click in graph coordinates; focuses whatever node is under it.
    ClickAt(Point),
}

/// What applying one completed fetch did.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Applied(Resource),
    /// The response was superseded before it arrived.
    Discarded(Resource),
    Failed(FetchFailure),
    HighlightChanged,
    AgentAnswered { replaced_graph: bool },
    InsightReady,
}

enum Payload {
    Articles(Result<Vec<ArticleSummary>>),
    Sectors(Result<Vec<String>>),
    Graph(Result<GraphSnapshot>),
    Analysis(Result<CompanyAnalysis>),
    Mentions { title: String, result: Result<Vec<NodeId>> },
    Content(Result<ArticleContent>),
    Agent(Result<AgentAnswer>),
    Insight(Result<String>),
}

struct Completion {
    ticket: Ticket,
    payload: Payload,
}

enum Wake {
    Completed(Option<Completion>),
    DebounceElapsed,
}

pub struct Session<A: ExplorerApi + 'static, L: Layout> {
    api: Arc<A>,
    view: ViewState,
    orchestrator: QueryOrchestrator,
    reading: ReadingTraversal,
    highlight: HighlightEngine,
    renderer: GraphRenderer<L>,
    theme: ThemeSlot,
    state: ExplorerState,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
    agent_busy: bool,
    insight_busy: bool,
}

/// Build a session against the REST backend named by the environment.
pub fn connect<L: Layout>(layout: L) -> Result<Session<RelatiqClient, L>> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    let client = RelatiqClient::from_config(&config)?;
    let theme = ThemeSlot::init(config.preferences_path.clone());
    info!(api = %config.api_base_url, theme = ?theme.get(), "Explorer session configured");
    Ok(Session::new(
        Arc::new(client),
        layout,
        theme,
        config.search_debounce,
    ))
}

impl<A: ExplorerApi + 'static, L: Layout> Session<A, L> {
    pub fn new(api: Arc<A>, layout: L, theme: ThemeSlot, search_debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let renderer = GraphRenderer::new(layout, theme.get());
        Self {
            api,
            view: ViewState::default(),
            orchestrator: QueryOrchestrator::new(search_debounce),
            reading: ReadingTraversal::new(),
            highlight: HighlightEngine::new(),
            renderer,
            theme,
            state: ExplorerState::default(),
            tx,
            rx,
            in_flight: 0,
            agent_busy: false,
            insight_busy: false,
        }
    }

    // --- accessors ---

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn state(&self) -> &ExplorerState {
        &self.state
    }

    pub fn renderer(&self) -> &GraphRenderer<L> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut GraphRenderer<L> {
        &mut self.renderer
    }

    pub fn highlight(&self) -> &HighlightSet {
        self.renderer.highlight()
    }

    pub fn reading(&self) -> &ReadingTraversal {
        &self.reading
    }

    pub fn theme(&self) -> Theme {
        self.theme.get()
    }

    /// True while a current request for `resource` is outstanding or waiting
    /// out its debounce window. Agent and insight report their busy flags.
    pub fn is_loading(&self, resource: Resource) -> bool {
        match resource {
            Resource::AgentQuery => self.agent_busy,
            Resource::Insight => self.insight_busy,
            _ => self.orchestrator.is_loading(resource),
        }
    }

    /// True while nothing is in flight and no debounce window is open.
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0 && self.orchestrator.deadline().is_none()
    }

    // --- actions ---

    /// Issue the opening fetches.
    pub fn start(&mut self) {
        for ticket in self.orchestrator.initial(&self.view) {
            self.spawn_view_fetch(ticket);
        }
    }

    pub fn dispatch(&mut self, action: UserAction) {
        debug!(?action, "Dispatching");
        match action {
            UserAction::SetFilters(filters) => {
                let next = ViewState {
                    filters,
                    ..self.view.clone()
                };
                self.transition(next);
            }
            UserAction::ToggleArticle(title) => self.toggle_article(&title),
            UserAction::SelectTab(tab) => {
                let next = ViewState {
                    mode: ViewMode::for_tab(tab, self.view.mode),
                    tab,
                    ..self.view.clone()
                };
                self.transition(next);
            }
            UserAction::SetViewMode(mode) => {
                let tab = if mode.permits(self.view.tab) {
                    self.view.tab
                } else {
                    mode.default_tab()
                };
                let next = ViewState {
                    mode,
                    tab,
                    ..self.view.clone()
                };
                self.transition(next);
            }
            UserAction::EnterReading => match self.reading.enter(self.view.selection.len()) {
                Some(cursor) => self.read_at(cursor),
                None => debug!("Reading mode needs a selection"),
            },
            UserAction::NextArticle => {
                if let Some(cursor) = self.reading.next(self.view.selection.len()) {
                    self.read_at(cursor);
                }
            }
            UserAction::PrevArticle => {
                if let Some(cursor) = self.reading.prev(self.view.selection.len()) {
                    self.read_at(cursor);
                }
            }
            UserAction::ExitReading => {
                if self.reading.exit() {
                    self.stop_reading();
                }
            }
            UserAction::SetTheme(theme) => self.set_theme(theme),
            UserAction::ToggleTheme => self.set_theme(self.theme.get().toggled()),
            UserAction::AskAgent(question) => self.ask_agent(question),
            UserAction::GenerateInsight(kind) => self.generate_insight(kind),
            UserAction::ClickNode(id) => {
                self.renderer.focus_node(id.as_str());
            }
            UserAction::ClickAt(point) => {
                if let Some(id) = self.renderer.node_at(point).cloned() {
                    self.renderer.focus_node(id.as_str());
                }
            }
        }
    }

    fn transition(&mut self, next: ViewState) {
        if next == self.view {
            return;
        }
        let prev = std::mem::replace(&mut self.view, next);
        for ticket in self
            .orchestrator
            .on_transition(&prev, &self.view, Instant::now())
        {
            self.spawn_view_fetch(ticket);
        }
    }

    fn toggle_article(&mut self, title: &str) {
        let mut next = self.view.clone();
        let selected = next.selection.toggle(title);
        debug!(title, selected, "Selection toggled");
        self.transition(next);

        self.highlight.reset_cache();
        let was_reading = self.reading.is_active();
        match self.reading.on_selection_changed(self.view.selection.len()) {
            Some(cursor) => self.read_at(cursor),
            None if was_reading => self.stop_reading(),
            None => {}
        }
    }

    /// Load highlight and text for the document under the reading cursor.
    fn read_at(&mut self, cursor: usize) {
        let Some(title) = self.view.selection.get(cursor).map(str::to_string) else {
            return;
        };
        debug!(cursor, %title, "Reading");

        let ticket = self.orchestrator.issue(Resource::Content);
        let content_title = title.clone();
        self.spawn(ticket, move |api| async move {
            Payload::Content(api.article_content(&content_title).await)
        });

        if let Some(cached) = self.highlight.cached(&title).cloned() {
            self.orchestrator.invalidate(Resource::Mentions);
            self.renderer.set_highlight(cached);
            return;
        }
        let ticket = self.orchestrator.issue(Resource::Mentions);
        self.spawn(ticket, move |api| async move {
            let result = api.article_mentions(&title).await;
            Payload::Mentions { title, result }
        });
    }

    fn stop_reading(&mut self) {
        self.orchestrator.invalidate(Resource::Mentions);
        self.orchestrator.invalidate(Resource::Content);
        self.state.reading_text = None;
        self.renderer.set_highlight(HighlightSet::empty());
    }

    fn set_theme(&mut self, theme: Theme) {
        if let Err(e) = self.theme.set(theme) {
            warn!(error = %e, "Theme changed but could not be persisted");
        }
        self.renderer.set_theme(theme);
    }

    fn ask_agent(&mut self, question: String) {
        let question = question.trim().to_string();
        if question.is_empty() {
            return;
        }
        if self.agent_busy {
            debug!("Agent query already running");
            return;
        }
        self.agent_busy = true;
        let ticket = self.orchestrator.issue(Resource::AgentQuery);
        self.spawn(ticket, move |api| async move {
            Payload::Agent(api.agent_query(&question).await)
        });
    }

    fn generate_insight(&mut self, kind: InsightKind) {
        if self.view.selection.is_empty() {
            debug!("Insight needs a selection");
            return;
        }
        if self.insight_busy {
            debug!("Insight already running");
            return;
        }
        self.insight_busy = true;
        let titles = self.view.selection.titles().to_vec();
        let ticket = self.orchestrator.issue(Resource::Insight);
        self.spawn(ticket, move |api| async move {
            Payload::Insight(api.agent_insight(&titles, kind).await)
        });
    }

    // --- fetch plumbing ---

    /// Spawn the fetch for a resource derived from the view state.
    fn spawn_view_fetch(&mut self, ticket: Ticket) {
        let filters = self.view.filters.clone();
        let titles = self.view.selection.titles().to_vec();
        match ticket.resource {
            Resource::Articles => self.spawn(ticket, move |api| async move {
                Payload::Articles(api.articles(&filters).await)
            }),
            Resource::Sectors => self.spawn(ticket, move |api| async move {
                Payload::Sectors(api.sectors().await)
            }),
            Resource::Graph => self.spawn(ticket, move |api| async move {
                Payload::Graph(api.network(&titles, &filters).await)
            }),
            Resource::Analysis => self.spawn(ticket, move |api| async move {
                Payload::Analysis(api.company_analysis(&titles).await)
            }),
            other => warn!(resource = %other, "Not a view-driven resource"),
        }
    }

    fn spawn<F, Fut>(&mut self, ticket: Ticket, fetch: F)
    where
        F: FnOnce(Arc<A>) -> Fut,
        Fut: Future<Output = Payload> + Send + 'static,
    {
        let work = fetch(Arc::clone(&self.api));
        let tx = self.tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let payload = work.await;
            // The receiver lives as long as the session; a send error means
            // the session is gone and nobody wants the result.
            let _ = tx.send(Completion { ticket, payload });
        });
    }

    /// Wait for the next completed fetch and apply it. Debounced fetches are
    /// issued here when their quiet period ends. Returns `None` once the
    /// session is idle.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        loop {
            if self.is_idle() {
                return None;
            }
            let deadline = self.orchestrator.deadline();
            let wake = tokio::select! {
                done = self.rx.recv() => Wake::Completed(done),
                _ = wait_for(deadline) => Wake::DebounceElapsed,
            };
            match wake {
                Wake::Completed(Some(done)) => {
                    self.in_flight -= 1;
                    return Some(self.complete(done));
                }
                Wake::Completed(None) => return None,
                Wake::DebounceElapsed => {
                    for ticket in self.orchestrator.fire_due(Instant::now()) {
                        self.spawn_view_fetch(ticket);
                    }
                }
            }
        }
    }

    /// Drive the session until nothing is in flight.
    pub async fn settle(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await {
            events.push(event);
        }
        events
    }

    fn complete(&mut self, done: Completion) -> SessionEvent {
        let Completion { ticket, payload } = done;
        match ticket.resource {
            Resource::AgentQuery => self.agent_busy = false,
            Resource::Insight => self.insight_busy = false,
            _ => {}
        }
        if !self.orchestrator.accept(ticket) {
            return SessionEvent::Discarded(ticket.resource);
        }

        let resource = ticket.resource;
        match payload {
            Payload::Articles(result) => self.apply(resource, result, |s, articles| {
                info!(count = articles.len(), "Article list replaced");
                s.state.articles = articles;
            }),
            Payload::Sectors(result) => self.apply(resource, result, |s, sectors| {
                s.state.sectors = sectors;
            }),
            Payload::Graph(result) => self.apply(resource, result, |s, snapshot| {
                let snapshot = Arc::new(snapshot.normalized());
                info!(
                    nodes = snapshot.nodes.len(),
                    edges = snapshot.edges.len(),
                    "Graph replaced"
                );
                s.state.graph = Arc::clone(&snapshot);
                s.renderer.set_snapshot(snapshot);
            }),
            Payload::Analysis(result) => self.apply(resource, result, |s, analysis| {
                info!(
                    companies = analysis.companies.len(),
                    connections = analysis.connections.len(),
                    "Company analysis replaced"
                );
                s.state.analysis = Some(analysis);
            }),
            Payload::Content(result) => self.apply(resource, result, |s, content| {
                s.state.reading_text = Some(content.text);
            }),
            Payload::Mentions { title, result } => {
                if let Err(e) = &result {
                    self.state.last_failure = Some(FetchFailure::new(resource, e));
                }
                let highlight = self.highlight.resolve(&title, result);
                self.renderer.set_highlight(highlight);
                SessionEvent::HighlightChanged
            }
            Payload::Agent(Ok(answer)) => {
                let replaced_graph = !answer.graph.is_empty();
                if replaced_graph {
                    // The agent's fragment wins over any network fetch still in flight.
                    self.orchestrator.invalidate(Resource::Graph);
                    let snapshot = Arc::new(answer.graph.clone().normalized());
                    info!(nodes = snapshot.nodes.len(), "Graph replaced by agent answer");
                    self.state.graph = Arc::clone(&snapshot);
                    self.renderer.set_snapshot(snapshot);
                }
                self.state.agent_answer = Some(answer);
                SessionEvent::AgentAnswered { replaced_graph }
            }
            Payload::Agent(Err(e)) => self.fail(resource, e),
            Payload::Insight(Ok(markdown)) => {
                self.state.insight = Some(markdown);
                SessionEvent::InsightReady
            }
            Payload::Insight(Err(e)) => self.fail(resource, e),
        }
    }

    fn apply<T>(
        &mut self,
        resource: Resource,
        result: Result<T>,
        write: impl FnOnce(&mut Self, T),
    ) -> SessionEvent {
        match result {
            Ok(value) => {
                write(self, value);
                if self
                    .state
                    .last_failure
                    .as_ref()
                    .is_some_and(|f| f.resource == resource)
                {
                    self.state.last_failure = None;
                }
                SessionEvent::Applied(resource)
            }
            Err(e) => self.fail(resource, e),
        }
    }

    fn fail(&mut self, resource: Resource, error: anyhow::Error) -> SessionEvent {
        warn!(%resource, error = %error, "Fetch failed, keeping previous data");
        let failure = FetchFailure::new(resource, &error);
        self.state.last_failure = Some(failure.clone());
        SessionEvent::Failed(failure)
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
