use crate::api::{ApiError, ApiResult};
use crate::config::RequestPolicy;
use crate::models::{ContentNode, FetchRequest, FilterCriteria};
use crate::state::explorer::{Action, Discard, Effect, ExplorerState, FetchTicket};
use async_trait::async_trait;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

/// Where children of a node come from.
#[async_trait(?Send)]
pub(crate) trait ContentSource {
    async fn fetch_children(&self, req: &FetchRequest) -> ApiResult<Vec<ContentNode>>;
}

/// How a request ended, when it did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum RequestOutcome {
    /// The response was merged into the tree.
    Applied,
    /// The response arrived but its chapter is gone.
    TargetMissing,
    Coalesced,
    Refused(&'static str),
    Discarded(Discard),
    /// Nothing needed fetching.
    Unchanged,
}

type Listener = Rc<dyn Fn(&ExplorerState)>;

/// Runs fetches for the explorer on the UI loop.
///
/// Owns the [`ExplorerState`] and is the only caller of its reducer. The state
/// is never borrowed across an await, so overlapping requests interleave freely;
/// the reducer's tickets decide which responses still count.
pub(crate) struct FetchCoordinator<S> {
    source: Rc<S>,
    state: Rc<RefCell<ExplorerState>>,
    listeners: Rc<RefCell<Vec<Listener>>>,
}

impl<S> Clone for FetchCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            state: self.state.clone(),
            listeners: self.listeners.clone(),
        }
    }
}

impl<S: ContentSource + 'static> FetchCoordinator<S> {
    pub fn new(source: S, policy: RequestPolicy) -> Self {
        Self {
            source: Rc::new(source),
            state: Rc::new(RefCell::new(ExplorerState::new(policy))),
            listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Called with a snapshot after every state change.
    pub fn subscribe(&self, listener: impl Fn(&ExplorerState) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&ExplorerState) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn dispatch(&self, action: Action) -> Effect {
        let effect = self.state.borrow_mut().reduce(action);
        self.notify();
        effect
    }

    fn notify(&self) {
        let listeners: Vec<Listener> = self.listeners.borrow().clone();
        if listeners.is_empty() {
            return;
        }
        // Listeners may dispatch again.
        let snapshot = self.state.borrow().clone();
        for listener in listeners {
            listener(&snapshot);
        }
    }

    /// Fetch the children of `parent_id` (`None` for the root level) and merge them.
    ///
    /// Like every operation below, the action is applied before this returns;
    /// only the network round-trip waits for the returned future.
    pub fn request_children(
        &self,
        tab_id: &str,
        parent_id: Option<&str>,
        filter: FilterCriteria,
    ) -> impl Future<Output = Result<RequestOutcome, ApiError>> + 'static {
        let request = FetchRequest {
            tab_id: tab_id.to_string(),
            parent_id: parent_id.map(str::to_string),
            filter,
        };
        self.run(Action::RequestChildren(request))
    }

    pub fn select_tab(&self, tab_id: &str) -> impl Future<Output = Result<RequestOutcome, ApiError>> + 'static {
        self.run(Action::SelectTab(tab_id.to_string()))
    }

    pub fn set_filter(
        &self,
        filter: FilterCriteria,
    ) -> impl Future<Output = Result<RequestOutcome, ApiError>> + 'static {
        self.run(Action::SetFilter(filter))
    }

    pub fn expand(&self, node_id: &str) -> impl Future<Output = Result<RequestOutcome, ApiError>> + 'static {
        self.run(Action::Expand(node_id.to_string()))
    }

    pub fn refresh_root(&self) -> impl Future<Output = Result<RequestOutcome, ApiError>> + 'static {
        self.run(Action::RefreshRoot)
    }

    pub fn reset_tree(&self) {
        self.dispatch(Action::ResetTree);
    }

    /// Dispatch `action` now; the returned future performs the fetch it asks for
    /// and dispatches the result.
    fn run(&self, action: Action) -> impl Future<Output = Result<RequestOutcome, ApiError>> + 'static {
        let begun = self.begin(action);
        let this = self.clone();
        async move {
            match begun {
                Ok(ticket) => this.complete(ticket).await,
                Err(outcome) => Ok(outcome),
            }
        }
    }

    fn begin(&self, action: Action) -> Result<FetchTicket, RequestOutcome> {
        match self.dispatch(action) {
            Effect::Fetch(ticket) => Ok(ticket),
            Effect::Coalesced => Err(RequestOutcome::Coalesced),
            Effect::Refused(why) => Err(RequestOutcome::Refused(why)),
            _ => Err(RequestOutcome::Unchanged),
        }
    }

    /// Perform the fetch for `ticket` and dispatch its result.
    async fn complete(&self, ticket: FetchTicket) -> Result<RequestOutcome, ApiError> {
        tracing::debug!(
            tab = %ticket.request.tab_id,
            parent = ?ticket.request.parent_id,
            generation = ticket.generation,
            "fetching content"
        );
        let result = self.source.fetch_children(&ticket.request).await;

        let effect = match result {
            Ok(nodes) => self.dispatch(Action::MergeChildren { ticket, nodes }),
            Err(error) => self.dispatch(Action::FetchFailed { ticket, error }),
        };

        match effect {
            Effect::Merged => Ok(RequestOutcome::Applied),
            Effect::TargetMissing => Ok(RequestOutcome::TargetMissing),
            Effect::Discarded(reason) => Ok(RequestOutcome::Discarded(reason)),
            Effect::Failed(error) => Err(error),
            _ => Ok(RequestOutcome::Unchanged),
        }
    }
}
