use serde::{Deserialize, Serialize};

/// What to do when a node is expanded again while its previous fetch is still in flight.
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub(crate) enum RequestPolicy {
    /// Ignore the new request; the in-flight one will land.
    #[default]
    Coalesce,
    /// Issue the new request; the older response is discarded when it lands.
    LatestWins,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
    pub request_policy: RequestPolicy,
    pub log_level: String,
}

impl EnvConfig {
    pub const DEFAULT_API_URL: &'static str = "http://localhost:6689";
    pub const DEFAULT_LOG_LEVEL: &'static str = "info";

    pub fn new() -> Self {
        let mut cfg = Self::defaults();

        // We support BOTH `window.ENV.API_URL` (documented in README) and
        // `window.ENV.api_url` (legacy/implementation detail) for compatibility.
        let Some(env) = web_sys::window()
            .and_then(|w| w.get("ENV"))
            .filter(|env| !env.is_undefined() && env.is_object())
        else {
            return cfg;
        };

        let get = |upper: &str, lower: &str| {
            [upper, lower].into_iter().find_map(|k| {
                js_sys::Reflect::get(&env, &k.into())
                    .ok()
                    .and_then(|v| v.as_string())
            })
        };

        if let Some(url) = get("API_URL", "api_url") {
            cfg.api_url = url;
        }
        if let Some(policy) = get("REQUEST_POLICY", "request_policy") {
            cfg.request_policy = Self::parse_policy(&policy);
        }
        if let Some(level) = get("LOG_LEVEL", "log_level") {
            cfg.log_level = level;
        }

        cfg
    }

    pub fn defaults() -> Self {
        Self {
            api_url: Self::DEFAULT_API_URL.to_string(),
            request_policy: RequestPolicy::default(),
            log_level: Self::DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    pub(crate) fn parse_policy(raw: &str) -> RequestPolicy {
        raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("unknown request policy {raw:?}, using {}", RequestPolicy::default());
            RequestPolicy::default()
        })
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}
