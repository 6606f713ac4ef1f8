mod api;
mod components;
mod config;
mod logging;
mod models;
mod pages;
mod state;
mod tree;

use crate::config::EnvConfig;
use crate::pages::ExplorerPage;
use crate::state::{AppContext, AppState};
use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::default()));

    view! {
        <main class="min-h-screen bg-background text-foreground">
            <ExplorerPage />
        </main>
    }
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use crate::api::{ApiClient, TOKEN_KEY};
    use crate::config::EnvConfig;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn storage() -> web_sys::Storage {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .expect("localStorage should be available")
    }

    #[wasm_bindgen_test]
    fn test_api_client_reads_token_from_storage() {
        let cfg = EnvConfig::defaults();

        storage().remove_item(TOKEN_KEY).expect("remove should work");
        assert!(ApiClient::load_from_storage(&cfg).token.is_none());

        storage().set_item(TOKEN_KEY, "t1").expect("set should work");
        let c = ApiClient::load_from_storage(&cfg);
        assert_eq!(c.token.as_deref(), Some("t1"));
        assert_eq!(c.base_url, cfg.api_url);

        storage().remove_item(TOKEN_KEY).expect("remove should work");
    }

    #[wasm_bindgen_test]
    fn test_env_config_without_window_env_uses_defaults() {
        let cfg = EnvConfig::new();
        assert_eq!(cfg.api_url, EnvConfig::DEFAULT_API_URL);
    }
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    logging::init(&EnvConfig::new().log_level);
    mount_to_body(App);
}
