//! SSE framing of delivered messages.
//!
//! Every delivery becomes one frame:
//!
//! ```text
//! event: message
//! data: <payload with line breaks escaped>
//!
//! ```

use axum::response::sse::Event;

use crate::domain::Message;

/// SSE event name used for every delivery.
pub const EVENT_NAME: &str = "message";

/// Escapes line breaks so the payload fits on a single `data:` line.
#[must_use]
pub fn escape_payload(raw: &str) -> String {
    raw.replace('\r', "\\r").replace('\n', "\\n")
}

/// Builds the SSE event for a delivered message.
#[must_use]
pub fn message_event(message: &Message) -> Event {
    Event::default()
        .event(EVENT_NAME)
        .data(escape_payload(message.raw()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newlines_become_literal_escapes() {
        assert_eq!(
            escape_payload("{\"a\":1,\n\"b\":2}"),
            "{\"a\":1,\\n\"b\":2}"
        );
        assert_eq!(escape_payload("x\r\ny"), "x\\r\\ny");
    }

    #[test]
    fn single_line_payload_is_unchanged() {
        assert_eq!(escape_payload(r#"{"a": "b"}"#), r#"{"a": "b"}"#);
    }
}
