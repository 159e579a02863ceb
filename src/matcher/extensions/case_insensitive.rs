//! Case-insensitive string equality.
//!
//! ```json
//! {"__match__": "case-insensitive", "value": "ValueToTest"}
//! ```

use serde_json::{Map, Value};

/// Registration name.
pub const NAME: &str = "case-insensitive";

/// Name the predicate was historically dispatched under.
pub const LEGACY_NAME: &str = "case-insensitive-match";

/// Matches when both the message value and the spec's `"value"` field are
/// strings that are equal after lowercasing.
#[must_use]
pub fn case_insensitive(value: &Value, spec: &Map<String, Value>) -> bool {
    let Some(expected) = spec.get("value").and_then(Value::as_str) else {
        return false;
    };
    value
        .as_str()
        .is_some_and(|actual| expected.to_lowercase() == actual.to_lowercase())
}
