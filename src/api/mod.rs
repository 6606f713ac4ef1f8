use crate::config::EnvConfig;
use crate::models::{ContentNode, FetchRequest};
use crate::state::fetch::ContentSource;
use async_trait::async_trait;
use thiserror::Error;

pub(crate) const TOKEN_KEY: &str = "course_explorer_token";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{message}")]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    pub(crate) fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            token: None,
        }
    }

    /// Base URL from `window.ENV`; token from the login flow's localStorage entry.
    pub fn load_from_storage(config: &EnvConfig) -> Self {
        let mut client = Self::new(config.api_url.clone());
        if let Some(token) = web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .and_then(|s| s.get_item(TOKEN_KEY).ok().flatten())
        {
            client.set_token(token);
        }
        client
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    fn get_auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    pub(crate) fn children_url(&self, req: &FetchRequest) -> String {
        let mut url = format!(
            "{}/content/tabs/{}/nodes?filter-by={}&query={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&req.tab_id),
            urlencoding::encode(&req.filter.filter_by),
            urlencoding::encode(&req.filter.query_text),
        );
        if let Some(parent_id) = &req.parent_id {
            url.push_str("&parent-id=");
            url.push_str(&urlencoding::encode(parent_id));
        }
        url
    }

    async fn send_api<T: serde::de::DeserializeOwned>(
        &self,
        mut req: reqwest::RequestBuilder,
    ) -> ApiResult<T> {
        if let Some(header) = self.get_auth_header() {
            req = req.header("Authorization", header);
        }

        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else if res.status().as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, "Request failed"))
        }
    }

    pub async fn get_children(&self, req: &FetchRequest) -> ApiResult<Vec<ContentNode>> {
        let client = reqwest::Client::new();
        let data: serde_json::Value = self.send_api(client.get(self.children_url(req))).await?;
        Self::parse_children_response(data)
    }

    /// Parse `{ "nodes": [...] }`.
    ///
    /// A missing `nodes` array is a contract violation. Individual entries that
    /// do not parse are skipped so one bad record doesn't hide a whole chapter.
    pub(crate) fn parse_children_response(data: serde_json::Value) -> ApiResult<Vec<ContentNode>> {
        let list = data
            .get("nodes")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ApiError::parse(format!("response is missing `nodes`: {data}")))?;

        let mut out: Vec<ContentNode> = Vec::with_capacity(list.len());
        for item in list {
            match serde_json::from_value::<ContentNode>(item.clone()) {
                Ok(node) if !node.id().trim().is_empty() => out.push(node),
                Ok(_) => tracing::warn!("skipping content node with empty id"),
                Err(e) => tracing::warn!("skipping malformed content node: {e}"),
            }
        }

        Ok(out)
    }
}

#[async_trait(?Send)]
impl ContentSource for ApiClient {
    async fn fetch_children(&self, req: &FetchRequest) -> ApiResult<Vec<ContentNode>> {
        self.get_children(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FilterCriteria;

    #[test]
    fn test_api_client_new() {
        let client = ApiClient::new("http://localhost:6689".to_string());
        assert_eq!(client.base_url, "http://localhost:6689");
        assert!(client.token.is_none());
    }

    #[test]
    fn test_api_client_get_auth_header() {
        let mut client = ApiClient::new("http://localhost:6689".to_string());
        assert!(client.get_auth_header().is_none());
        client.set_token("my-jwt-token".to_string());
        assert_eq!(client.get_auth_header().as_deref(), Some("Bearer my-jwt-token"));
    }

    #[test]
    fn test_children_url_for_root() {
        let client = ApiClient::new("http://localhost:6689/".to_string());
        let req = FetchRequest::root("my courses", FilterCriteria::new("status", "a&b"));
        assert_eq!(
            client.children_url(&req),
            "http://localhost:6689/content/tabs/my%20courses/nodes?filter-by=status&query=a%26b"
        );
    }

    #[test]
    fn test_children_url_with_parent() {
        let client = ApiClient::new("http://localhost:6689".to_string());
        let req = FetchRequest::children("t1", "ch/1", FilterCriteria::default());
        assert_eq!(
            client.children_url(&req),
            "http://localhost:6689/content/tabs/t1/nodes?filter-by=&query=&parent-id=ch%2F1"
        );
    }

    #[test]
    fn test_parse_children_response_skips_bad_entries() {
        let data = serde_json::json!({
            "nodes": [
                {"type": "chapter", "id": "c1", "name": "Basics", "children": null},
                {"type": "lesson", "id": "l1", "title": "Intro", "durationSeconds": 90, "mediaType": "slide"},
                {"type": "lesson", "id": "l2", "title": "Broken"},
                {"type": "chapter", "id": " ", "name": "Blank"},
                {"type": "quiz", "id": "q1"}
            ]
        });
        let nodes = ApiClient::parse_children_response(data).expect("should parse");
        let ids: Vec<&str> = nodes.iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec!["c1", "l1"]);
    }

    #[test]
    fn test_parse_children_response_keeps_float_durations() {
        let data = serde_json::json!({
            "nodes": [
                {"type": "lesson", "id": "l1", "title": "One", "durationSeconds": 90.0, "mediaType": "video"},
                {"type": "lesson", "id": "l2", "title": "Two", "durationSeconds": 90, "mediaType": "video"}
            ]
        });
        let nodes = ApiClient::parse_children_response(data).expect("should parse");
        let ids: Vec<&str> = nodes.iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec!["l1", "l2"]);
        assert_eq!(nodes[0].as_lesson().map(|l| l.duration_seconds), Some(90));
    }

    #[test]
    fn test_parse_children_response_requires_nodes() {
        let err = ApiClient::parse_children_response(serde_json::json!({"items": []}))
            .expect_err("missing nodes should fail");
        assert_eq!(err.kind, ApiErrorKind::Parse);
    }

    #[test]
    fn test_api_error_display_is_message() {
        let e = ApiError::http(reqwest::StatusCode::BAD_GATEWAY, "upstream".into(), "Request failed");
        assert_eq!(e.to_string(), "Request failed (502 Bad Gateway): upstream");
        assert_eq!(e.kind, ApiErrorKind::Http);
    }
}
