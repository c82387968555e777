//! Fetch orchestration.
//!
//! `decide_fetches` is a pure function from a pair of view states to the
//! fetches that transition requires. `QueryOrchestrator` turns those intents
//! into generation-tagged tickets, runs the entity-search debounce window, and
//! answers the only question that matters when a response lands: is this
//! still the latest request for its resource?

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use relatiq_common::{ActiveTab, FilterCriteria, SelectionList, ViewMode};

/// Everything a response can be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Resource {
    Articles,
    Sectors,
    Graph,
    Analysis,
    Mentions,
    Content,
    AgentQuery,
    Insight,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Articles => "articles",
            Resource::Sectors => "sectors",
            Resource::Graph => "graph",
            Resource::Analysis => "analysis",
            Resource::Mentions => "mentions",
            Resource::Content => "content",
            Resource::AgentQuery => "agent_query",
            Resource::Insight => "insight",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The composite state fetch decisions are made from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub filters: FilterCriteria,
    pub selection: SelectionList,
    pub mode: ViewMode,
    pub tab: ActiveTab,
}

impl ViewState {
    fn shows(&self, tab: ActiveTab) -> bool {
        self.tab == tab && self.mode.permits(tab)
    }

    fn wants_analysis(&self) -> bool {
        self.shows(ActiveTab::Analysis) && !self.selection.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FetchIntent {
    /// Fetch now.
    Immediate(Resource),
    /// Fetch once the entity-search quiet period has elapsed.
    Debounced(Resource),
    /// Inputs changed but the resource is not on screen; anything in flight
    /// for it is stale.
    Invalidate(Resource),
}

impl FetchIntent {
    pub fn resource(&self) -> Resource {
        match self {
            FetchIntent::Immediate(r) | FetchIntent::Debounced(r) | FetchIntent::Invalidate(r) => *r,
        }
    }
}

/// Decide which fetches the transition `prev -> next` requires.
pub fn decide_fetches(prev: &ViewState, next: &ViewState) -> BTreeSet<FetchIntent> {
    use FetchIntent::*;

    let mut intents = BTreeSet::new();
    let filters_changed = prev.filters != next.filters;
    let search_only = prev.filters.differs_only_in_search(&next.filters);
    let selection_changed = prev.selection != next.selection;

    if filters_changed {
        intents.insert(if search_only {
            Debounced(Resource::Articles)
        } else {
            Immediate(Resource::Articles)
        });
    }

    let graph_visible = next.shows(ActiveTab::Graph);
    let graph_entered = graph_visible && !prev.shows(ActiveTab::Graph);
    if graph_visible {
        if graph_entered || selection_changed || (filters_changed && !search_only) {
            intents.insert(Immediate(Resource::Graph));
        } else if search_only {
            intents.insert(Debounced(Resource::Graph));
        }
    } else if selection_changed || filters_changed || prev.shows(ActiveTab::Graph) {
        // Leaving the tab also cancels a pending debounced graph fetch.
        intents.insert(Invalidate(Resource::Graph));
    }

    let analysis_wanted = next.wants_analysis();
    let analysis_was_wanted = prev.wants_analysis();
    if analysis_wanted && (!analysis_was_wanted || selection_changed) {
        intents.insert(Immediate(Resource::Analysis));
    } else if selection_changed || (analysis_was_wanted && !analysis_wanted) {
        intents.insert(Invalidate(Resource::Analysis));
    }

    intents
}

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub resource: Resource,
    pub generation: u64,
}

/// Per-resource generation counters.
#[derive(Debug, Default)]
pub struct Generations {
    latest: HashMap<Resource, u64>,
    outstanding: HashSet<Resource>,
}

impl Generations {
    pub fn issue(&mut self, resource: Resource) -> Ticket {
        let generation = self.bump(resource);
        self.outstanding.insert(resource);
        Ticket {
            resource,
            generation,
        }
    }

    /// Supersede whatever is in flight for `resource` without issuing anything.
    pub fn invalidate(&mut self, resource: Resource) {
        self.bump(resource);
        self.outstanding.remove(&resource);
    }

    pub fn latest(&self, resource: Resource) -> u64 {
        self.latest.get(&resource).copied().unwrap_or(0)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest(ticket.resource) == ticket.generation
    }

    /// Claim a response. Returns false for superseded tickets.
    pub fn accept(&mut self, ticket: Ticket) -> bool {
        if self.is_current(ticket) {
            self.outstanding.remove(&ticket.resource);
            true
        } else {
            false
        }
    }

    pub fn is_outstanding(&self, resource: Resource) -> bool {
        self.outstanding.contains(&resource)
    }

    fn bump(&mut self, resource: Resource) -> u64 {
        let generation = self.latest.entry(resource).or_insert(0);
        *generation += 1;
        *generation
    }
}

pub struct QueryOrchestrator {
    quiet_period: Duration,
    generations: Generations,
    debounced: BTreeSet<Resource>,
    deadline: Option<Instant>,
}

impl QueryOrchestrator {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            generations: Generations::default(),
            debounced: BTreeSet::new(),
            deadline: None,
        }
    }

    /// Tickets for a fresh session: the article list, the sector catalogue,
    /// and whatever the opening tab shows.
    pub fn initial(&mut self, view: &ViewState) -> Vec<Ticket> {
        let mut resources = vec![Resource::Articles, Resource::Sectors];
        if view.shows(ActiveTab::Graph) {
            resources.push(Resource::Graph);
        }
        if view.wants_analysis() {
            resources.push(Resource::Analysis);
        }
        resources.into_iter().map(|r| self.issue(r)).collect()
    }

    /// Apply the intents of a transition. Returns tickets to fetch right away;
    /// debounced resources come back later from `fire_due`.
    pub fn on_transition(&mut self, prev: &ViewState, next: &ViewState, now: Instant) -> Vec<Ticket> {
        let mut tickets = Vec::new();
        for intent in decide_fetches(prev, next) {
            match intent {
                FetchIntent::Immediate(resource) => {
                    self.debounced.remove(&resource);
                    tickets.push(self.issue(resource));
                }
                FetchIntent::Debounced(resource) => {
                    self.generations.invalidate(resource);
                    self.debounced.insert(resource);
                    self.deadline = Some(now + self.quiet_period);
                    debug!(%resource, "Fetch debounced");
                }
                FetchIntent::Invalidate(resource) => {
                    self.debounced.remove(&resource);
                    self.generations.invalidate(resource);
                    debug!(%resource, "In-flight fetch superseded");
                }
            }
        }
        if self.debounced.is_empty() {
            self.deadline = None;
        }
        tickets
    }

    /// When the pending debounce window closes, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Issue the debounced fetches if their quiet period is over.
    pub fn fire_due(&mut self, now: Instant) -> Vec<Ticket> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                let due = std::mem::take(&mut self.debounced);
                due.into_iter().map(|r| self.issue(r)).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn issue(&mut self, resource: Resource) -> Ticket {
        let ticket = self.generations.issue(resource);
        debug!(%resource, generation = ticket.generation, "Fetch issued");
        ticket
    }

    pub fn invalidate(&mut self, resource: Resource) {
        self.debounced.remove(&resource);
        if self.debounced.is_empty() {
            self.deadline = None;
        }
        self.generations.invalidate(resource);
    }

    pub fn accept(&mut self, ticket: Ticket) -> bool {
        let accepted = self.generations.accept(ticket);
        if !accepted {
            debug!(
                resource = %ticket.resource,
                generation = ticket.generation,
                latest = self.generations.latest(ticket.resource),
                "Discarding stale response"
            );
        }
        accepted
    }

    pub fn is_loading(&self, resource: Resource) -> bool {
        self.generations.is_outstanding(resource) || self.debounced.contains(&resource)
    }
}
