use crate::api::{ApiClient, ApiError, ApiErrorKind};
use crate::models::FilterCriteria;
use crate::state::explorer::ExplorerState;
use crate::state::fetch::{FetchCoordinator, RequestOutcome};
use crate::state::AppContext;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::future::Future;

/// Reactive front of the content tree for the explorer page.
///
/// Responsibilities:
/// - own the fetch coordinator for the session
/// - mirror every state change into `state` so views re-render
/// - spawn fetches on the UI loop and keep the last error for display
///
/// Non-responsibilities:
/// - view-local open/closed state of chapters
#[derive(Clone, Copy)]
pub(crate) struct ContentSyncController {
    coordinator: StoredValue<FetchCoordinator<ApiClient>, LocalStorage>,

    /// Latest explorer snapshot. Nodes off the changed path keep their `Arc`s.
    pub state: RwSignal<ExplorerState>,

    /// Most recent failure, for a banner. Per-node failures live in the load states.
    pub last_error: RwSignal<Option<String>>,

    /// Set when the backend rejected our token.
    pub unauthorized: RwSignal<bool>,
}

impl ContentSyncController {
    pub fn new(app_state: &AppContext) -> Self {
        let api_client = app_state.0.api_client.get_untracked();
        let coordinator = FetchCoordinator::new(api_client, app_state.0.config.request_policy);

        let state = RwSignal::new(coordinator.with_state(|s| s.clone()));
        coordinator.subscribe(move |s| state.set(s.clone()));

        Self {
            coordinator: StoredValue::new_local(coordinator),
            state,
            last_error: RwSignal::new(None),
            unauthorized: RwSignal::new(false),
        }
    }

    pub fn select_tab(&self, tab_id: &str) {
        let pending = self.coordinator.get_value().select_tab(tab_id);
        self.settle(pending);
    }

    pub fn set_filter(&self, filter: FilterCriteria) {
        let pending = self.coordinator.get_value().set_filter(filter);
        self.settle(pending);
    }

    /// Fetch a chapter's children.
    pub fn expand(&self, node_id: &str) {
        let pending = self.coordinator.get_value().expand(node_id);
        self.settle(pending);
    }

    /// Re-issue the request for a failed level: the root (`None`) or a chapter.
    pub fn retry(&self, node_id: Option<&str>) {
        let Some((tab_id, filter)) = self.state.with_untracked(|s| {
            s.nav()
                .tab_id()
                .map(|tab| (tab.to_string(), s.nav().filter().clone()))
        }) else {
            return;
        };
        let pending = self.coordinator.get_value().request_children(&tab_id, node_id, filter);
        self.settle(pending);
    }

    pub fn refresh(&self) {
        let pending = self.coordinator.get_value().refresh_root();
        self.settle(pending);
    }

    pub fn reset(&self) {
        self.coordinator.get_value().reset_tree();
    }

    /// The action behind `pending` is already applied; wait for its fetch on the UI loop.
    fn settle(&self, pending: impl Future<Output = Result<RequestOutcome, ApiError>> + 'static) {
        let coordinator = self.coordinator.get_value();
        let last_error = self.last_error;
        let unauthorized = self.unauthorized;
        spawn_local(async move {
            match pending.await {
                Ok(RequestOutcome::Applied) | Ok(RequestOutcome::Unchanged) => last_error.set(None),
                Ok(outcome) => tracing::debug!(?outcome, "content request settled"),
                Err(e) => {
                    if e.kind == ApiErrorKind::Unauthorized {
                        unauthorized.set(true);
                    }
                    last_error.set(Some(e.to_string()));
                }
            }
            coordinator.with_state(|s| {
                tracing::debug!(
                    scope = s.scope(),
                    policy = %s.policy(),
                    nodes = s.tree().node_count(),
                    expanding = ?s.nav().expanding(),
                    diagnostics = ?s.diagnostics(),
                    "content state"
                )
            });
        });
    }
}
