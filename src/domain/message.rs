//! Opaque message payloads.
//!
//! A [`Message`] carries raw text verbatim. Nothing is validated when a
//! message is created; the payload is only interpreted as JSON when a
//! matcher looks at it.

use std::fmt;
use std::sync::Arc;

/// Canonical payload delivered to ping-only pools.
pub const PING_PAYLOAD: &str = "{}";

/// Immutable message payload.
///
/// Cloning is cheap: the text lives behind an [`Arc`] and is shared by
/// every loop that currently holds the message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    raw: Arc<str>,
}

impl Message {
    /// Wraps the given text without parsing it.
    #[must_use]
    pub fn new(raw: impl Into<Arc<str>>) -> Self {
        Self { raw: raw.into() }
    }

    /// The empty JSON object delivered in place of matched content when a
    /// pool runs in ping-only mode.
    #[must_use]
    pub fn ping() -> Self {
        Self::new(PING_PAYLOAD)
    }

    /// Returns the stored payload unchanged.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parses the payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns the [`serde_json::Error`] if the payload is not valid JSON.
    pub fn parse(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.raw)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<String> for Message {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for Message {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn raw_is_verbatim() {
        let text = "  {\"a\": 1}\n";
        assert_eq!(Message::new(text).raw(), text);
    }

    #[test]
    fn invalid_json_is_accepted_at_creation() {
        let msg = Message::from("{not json");
        assert_eq!(msg.raw(), "{not json");
        assert!(msg.parse().is_err());
    }

    #[test]
    fn ping_is_empty_object() {
        let Ok(value) = Message::ping().parse() else {
            panic!("ping payload must be JSON");
        };
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn clones_share_payload() {
        let a = Message::from(String::from("{\"k\":true}"));
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(b.to_string(), "{\"k\":true}");
    }
}
