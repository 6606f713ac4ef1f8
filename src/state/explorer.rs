use crate::api::ApiError;
use crate::config::RequestPolicy;
use crate::models::{ContentNode, FetchRequest, FilterCriteria};
use crate::state::navigation::NavigationState;
use crate::tree::{merge, ContentTree};
use std::collections::HashMap;

/// `None` is the root level of the active tab.
pub(crate) type NodeKey = Option<String>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum LoadState {
    NotLoaded,
    Loading,
    Loaded,
    Failed(String),
}

/// Identifies one issued fetch. A response is applied only if its ticket is still current.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FetchTicket {
    pub request: FetchRequest,
    /// Reset counter at issue time.
    pub scope: u64,
    /// Globally increasing; the latest one per node wins.
    pub generation: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Discard {
    /// Issued before the last tab/filter change or reset.
    StaleScope,
    /// A newer request for the same node was issued after this one.
    Superseded,
}

/// Counters for the races the reducer absorbs silently.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Diagnostics {
    pub stale_responses: u64,
    pub superseded_responses: u64,
    pub merge_target_misses: u64,
}

#[derive(Clone, Debug)]
pub(crate) enum Action {
    SelectTab(String),
    SetFilter(FilterCriteria),
    ResetTree,
    Expand(String),
    RefreshRoot,
    RequestChildren(FetchRequest),
    MergeChildren {
        ticket: FetchTicket,
        nodes: Vec<ContentNode>,
    },
    FetchFailed {
        ticket: FetchTicket,
        error: ApiError,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Effect {
    Idle,
    /// The caller must perform this fetch and dispatch its result.
    Fetch(FetchTicket),
    /// The node already has a request in flight.
    Coalesced,
    Refused(&'static str),
    Merged,
    TargetMissing,
    Discarded(Discard),
    Failed(ApiError),
}

/// Everything the content explorer knows, changed only through [`ExplorerState::reduce`].
#[derive(Clone, Debug)]
pub(crate) struct ExplorerState {
    nav: NavigationState,
    tree: ContentTree,
    load: HashMap<NodeKey, LoadState>,
    latest: HashMap<NodeKey, u64>,
    scope: u64,
    /// The (tab, filter) the current tree belongs to.
    scope_key: Option<(String, FilterCriteria)>,
    next_generation: u64,
    policy: RequestPolicy,
    diagnostics: Diagnostics,
}

impl ExplorerState {
    pub fn new(policy: RequestPolicy) -> Self {
        Self {
            nav: NavigationState::default(),
            tree: ContentTree::new(),
            load: HashMap::new(),
            latest: HashMap::new(),
            scope: 0,
            scope_key: None,
            next_generation: 0,
            policy,
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn nav(&self) -> &NavigationState {
        &self.nav
    }

    pub fn tree(&self) -> &ContentTree {
        &self.tree
    }

    pub fn scope(&self) -> u64 {
        self.scope
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn policy(&self) -> RequestPolicy {
        self.policy
    }

    /// Load state of the root level (`None`) or a chapter.
    ///
    /// Chapters that arrived with their children inlined count as loaded.
    pub fn load_state(&self, node_id: Option<&str>) -> LoadState {
        let key = node_id.map(str::to_string);
        if let Some(state) = self.load.get(&key) {
            return state.clone();
        }
        match node_id {
            Some(id) if self.tree.find_chapter(id).is_some_and(|c| c.is_loaded()) => {
                LoadState::Loaded
            }
            _ => LoadState::NotLoaded,
        }
    }

    pub fn reduce(&mut self, action: Action) -> Effect {
        match action {
            Action::SelectTab(tab_id) => {
                if !self.nav.select_tab(&tab_id) {
                    return Effect::Idle;
                }
                self.reset_tree();
                self.request_root()
            }
            Action::SetFilter(filter) => {
                // Re-applying the active filter refreshes the root without clearing the tree.
                if self.nav.set_filter(filter) {
                    self.reset_tree();
                }
                self.request_root()
            }
            Action::ResetTree => {
                self.reset_tree();
                Effect::Idle
            }
            Action::Expand(node_id) => self.expand(node_id),
            Action::RefreshRoot => self.request_root(),
            Action::RequestChildren(request) => self.begin(request),
            Action::MergeChildren { ticket, nodes } => self.merge_children(ticket, nodes),
            Action::FetchFailed { ticket, error } => self.fetch_failed(ticket, error),
        }
    }

    fn reset_tree(&mut self) {
        self.tree = ContentTree::new();
        self.load.clear();
        self.latest.clear();
        self.scope += 1;
        self.scope_key = self
            .nav
            .tab_id()
            .map(|tab| (tab.to_string(), self.nav.filter().clone()));
        self.nav.set_expanding(None);
        tracing::debug!(scope = self.scope, "content tree reset");
    }

    fn request_root(&mut self) -> Effect {
        match self.nav.root_request() {
            Some(request) => self.begin(request),
            None => Effect::Refused("no tab selected"),
        }
    }

    fn expand(&mut self, node_id: String) -> Effect {
        let Some(request) = self.nav.children_request(&node_id) else {
            return Effect::Refused("no tab selected");
        };
        if self.tree.find_chapter(&node_id).is_none() {
            tracing::debug!(%node_id, "expand ignored: not a chapter in the current tree");
            return Effect::Refused("not a chapter in the current tree");
        }

        let effect = self.begin(request);
        if matches!(effect, Effect::Fetch(_)) {
            self.nav.set_expanding(Some(node_id));
        }
        effect
    }

    fn begin(&mut self, request: FetchRequest) -> Effect {
        let key = (request.tab_id.clone(), request.filter.clone());

        if request.is_root() {
            // A root load for another (tab, filter) must never show the old tree while loading.
            if self.scope_key.as_ref() != Some(&key) {
                self.nav.select_tab(&request.tab_id);
                self.nav.set_filter(request.filter.clone());
                self.reset_tree();
            }
        } else if self.scope_key.as_ref() != Some(&key) {
            return Effect::Refused("request is for an inactive tab or filter");
        }

        let node: NodeKey = request.parent_id.clone();
        if self.policy == RequestPolicy::Coalesce
            && self.load.get(&node) == Some(&LoadState::Loading)
        {
            tracing::debug!(?node, "fetch coalesced with in-flight request");
            return Effect::Coalesced;
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        self.latest.insert(node.clone(), generation);
        self.load.insert(node, LoadState::Loading);

        Effect::Fetch(FetchTicket {
            request,
            scope: self.scope,
            generation,
        })
    }

    fn check_ticket(&mut self, ticket: &FetchTicket) -> Result<(), Discard> {
        let req = &ticket.request;
        if ticket.scope != self.scope || !self.nav.is_active(&req.tab_id, &req.filter) {
            self.diagnostics.stale_responses += 1;
            tracing::debug!(?req.parent_id, ticket.scope, "discarding response from an old scope");
            return Err(Discard::StaleScope);
        }
        if self.latest.get(&req.parent_id) != Some(&ticket.generation) {
            self.diagnostics.superseded_responses += 1;
            tracing::debug!(?req.parent_id, ticket.generation, "discarding superseded response");
            return Err(Discard::Superseded);
        }
        Ok(())
    }

    fn merge_children(&mut self, ticket: FetchTicket, nodes: Vec<ContentNode>) -> Effect {
        if let Err(reason) = self.check_ticket(&ticket) {
            return Effect::Discarded(reason);
        }

        let node = ticket.request.parent_id;
        let effect = match node.as_deref() {
            Some(parent_id) if self.tree.find_chapter(parent_id).is_none() => {
                self.diagnostics.merge_target_misses += 1;
                tracing::warn!(%parent_id, "fetched children have no chapter to attach to");
                self.load.remove(&node);
                Effect::TargetMissing
            }
            _ => {
                self.tree = merge(&self.tree, node.as_deref(), nodes);
                if node.is_none() {
                    // Chapters were replaced; only in-flight child loads stay meaningful.
                    self.load
                        .retain(|k, s| k.is_none() || *s == LoadState::Loading);
                }
                self.load.insert(node.clone(), LoadState::Loaded);
                Effect::Merged
            }
        };

        if let Some(id) = node.as_deref() {
            self.nav.finish_expanding(id);
        }
        effect
    }

    fn fetch_failed(&mut self, ticket: FetchTicket, error: ApiError) -> Effect {
        if let Err(reason) = self.check_ticket(&ticket) {
            return Effect::Discarded(reason);
        }

        let node = ticket.request.parent_id;
        tracing::warn!(?node, "could not load content: {error}");
        self.load
            .insert(node.clone(), LoadState::Failed(error.message.clone()));
        if let Some(id) = node.as_deref() {
            self.nav.finish_expanding(id);
        }
        Effect::Failed(error)
    }
}

impl Default for ExplorerState {
    fn default() -> Self {
        Self::new(RequestPolicy::default())
    }
}
