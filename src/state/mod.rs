pub(crate) mod content_sync;
pub(crate) mod explorer;
pub(crate) mod fetch;
pub(crate) mod navigation;

use crate::api::ApiClient;
use crate::config::EnvConfig;
use leptos::prelude::*;

#[derive(Clone)]
pub(crate) struct AppState {
    pub config: EnvConfig,
    pub api_client: RwSignal<ApiClient>,
}

impl AppState {
    pub fn new(config: EnvConfig) -> Self {
        let api_client = ApiClient::load_from_storage(&config);
        Self {
            config,
            api_client: RwSignal::new(api_client),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(EnvConfig::new())
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
