//! JSON envelope for successful responses.
//!
//! ```json
//! {
//!   "data": { ... },
//!   "meta": { "request_id": "...", "timestamp": "...", "response_time_ms": 5 },
//!   "_links": { "self": "/api/v1/agents/Alice" }
//! }
//! ```
//!
//! Failures use the same `meta` block with `errors` in place of `data`; see
//! [`AppError`](crate::http::error::AppError).

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ApiMeta,
    #[serde(rename = "_links", skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<&'static str, String>,
}

#[derive(Debug, Serialize)]
pub struct ApiMeta {
    /// UUID v7, unique per response.
    pub request_id: String,
    /// RFC 3339.
    pub timestamp: String,
    pub response_time_ms: u64,
}

impl ApiMeta {
    /// Meta block for a request that started at `start`.
    pub fn since(start: Instant) -> Self {
        Self {
            request_id: uuid::Uuid::now_v7().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            response_time_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap `data`, timing the handler from `start`.
    pub fn timed(data: T, start: Instant) -> Self {
        Self {
            data,
            meta: ApiMeta::since(start),
            links: BTreeMap::new(),
        }
    }

    pub fn with_link(mut self, rel: &'static str, href: &str) -> Self {
        self.links.insert(rel, href.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let resp = ApiResponse::timed(serde_json::json!({"name": "Alice"}), Instant::now())
            .with_link("self", "/api/v1/agents/Alice");
        let value = serde_json::to_value(&resp).unwrap();

        assert_eq!(value["data"]["name"], "Alice");
        assert_eq!(value["_links"]["self"], "/api/v1/agents/Alice");
        assert!(value["meta"]["request_id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(value["meta"]["response_time_ms"].is_u64());
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn test_links_omitted_when_empty() {
        let value = serde_json::to_value(ApiResponse::timed(1, Instant::now())).unwrap();
        assert!(value.get("_links").is_none());
    }
}
