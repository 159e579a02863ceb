//! DTOs for the hub endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::DistMethod;
use crate::error::HubError;

/// Query parameters accepted by `GET /` and `POST /`.
#[derive(Debug, Default, Deserialize)]
pub struct HubParams {
    /// Match specification (subscribe) or message (publish). When absent
    /// or empty the request body is used instead.
    pub q: Option<String>,
    /// `"true"` delivers empty pings instead of message content.
    pub ping_only: Option<String>,
    /// Distribution method: `broadcast`, `random` or `round-robin`.
    pub dm: Option<String>,
}

impl HubParams {
    /// Returns `q` if present and non-empty, otherwise `body`.
    #[must_use]
    pub fn text_or(&self, body: String) -> String {
        match self.q.as_deref() {
            Some(q) if !q.is_empty() => q.to_owned(),
            _ => body,
        }
    }

    /// Whether ping-only delivery was requested.
    #[must_use]
    pub fn ping_only(&self) -> bool {
        self.ping_only.as_deref() == Some("true")
    }

    /// Parsed distribution method, broadcast when absent.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidRequest`] for an unknown method name.
    pub fn dist_method(&self) -> Result<DistMethod, HubError> {
        match self.dm.as_deref() {
            None | Some("") => Ok(DistMethod::default()),
            Some(name) => name.parse(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"healthy"` when the server answers.
    pub status: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
}

/// Registered extension predicates.
#[derive(Debug, Serialize)]
pub struct ExtensionListResponse {
    /// Names usable as `__match__` values, sorted.
    pub extensions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(q: Option<&str>, ping_only: Option<&str>, dm: Option<&str>) -> HubParams {
        HubParams {
            q: q.map(str::to_owned),
            ping_only: ping_only.map(str::to_owned),
            dm: dm.map(str::to_owned),
        }
    }

    #[test]
    fn query_takes_precedence_over_body() {
        assert_eq!(
            params(Some("{\"a\":1}"), None, None).text_or("{}".into()),
            "{\"a\":1}"
        );
        assert_eq!(params(Some(""), None, None).text_or("{}".into()), "{}");
        assert_eq!(params(None, None, None).text_or("body".into()), "body");
    }

    #[test]
    fn ping_only_needs_literal_true() {
        assert!(params(None, Some("true"), None).ping_only());
        assert!(!params(None, Some("1"), None).ping_only());
        assert!(!params(None, None, None).ping_only());
    }

    #[test]
    fn dist_method_defaults_to_broadcast() {
        assert_eq!(
            params(None, None, None).dist_method().ok(),
            Some(DistMethod::Broadcast)
        );
        assert_eq!(
            params(None, None, Some("round-robin")).dist_method().ok(),
            Some(DistMethod::RoundRobin)
        );
        assert!(params(None, None, Some("fanout")).dist_method().is_err());
    }
}
