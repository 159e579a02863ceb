//! Structural matcher: decides whether a JSON message satisfies a match
//! specification.
//!
//! Matching is total. Every failure (unparseable message, missing key,
//! type mismatch, unknown or failing extension) is a non-match, never an
//! error.
//!
//! For each key in the specification:
//!
//! - the message must carry the key with a non-null value;
//! - `{"__match__": "<name>", ...}` delegates to the named
//!   [`ExtensionRegistry`] predicate;
//! - any other object requires an object in the message that recursively
//!   satisfies it;
//! - anything else requires the same JSON type and an equal value.
//!
//! Keys are combined with short-circuit AND, so `{}` matches every JSON
//! object.

pub mod extensions;
pub mod geometry;
pub mod registry;
pub mod spec;

use std::sync::Arc;

use serde_json::{Map, Value};

pub use registry::{ExtensionRegistry, Predicate};
pub use spec::{EXTENSION_KEY, ExtensionCall, MatchSpec, SpecError, SpecValue};

use crate::domain::Message;

/// Matching engine bound to an extension registry.
///
/// Cheap to clone; the registry is shared.
#[derive(Debug, Clone)]
pub struct Matcher {
    registry: Arc<ExtensionRegistry>,
}

impl Matcher {
    /// Creates a matcher using `registry` for extension lookups.
    #[must_use]
    pub fn with_registry(registry: Arc<ExtensionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this matcher consults.
    #[must_use]
    pub fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }

    /// Returns `true` if `message` parses as a JSON object satisfying
    /// `spec`.
    #[must_use]
    pub fn matches(&self, message: &Message, spec: &MatchSpec) -> bool {
        match message.parse() {
            Ok(Value::Object(fields)) => self.matches_object(&fields, spec),
            Ok(_) => {
                tracing::trace!("message is not a JSON object");
                false
            }
            Err(err) => {
                tracing::trace!(%err, "message is not valid JSON");
                false
            }
        }
    }

    /// Matches an already-parsed object against `spec`.
    #[must_use]
    pub fn matches_object(&self, message: &Map<String, Value>, spec: &MatchSpec) -> bool {
        spec.fields().iter().all(|(key, expected)| {
            let Some(actual) = message.get(key).filter(|v| !v.is_null()) else {
                return false;
            };
            match expected {
                SpecValue::Extension(call) => self.registry.evaluate(call, actual),
                SpecValue::Object(nested) => match actual {
                    Value::Object(inner) => self.matches_object(inner, nested),
                    _ => false,
                },
                SpecValue::Literal(literal) => literal_eq(actual, literal),
            }
        })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_registry(ExtensionRegistry::shared_builtin())
    }
}

/// Matches `message` against `spec` with the built-in extensions.
#[must_use]
pub fn matches(message: &Message, spec: &MatchSpec) -> bool {
    Matcher::default().matches(message, spec)
}

/// Same JSON type and equal value. Numbers compare as `f64`, so `1` and
/// `1.0` are equal while `1` and `"1"` are not.
fn literal_eq(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| literal_eq(x, y))
        }
        (Value::Object(a), Value::Object(b)) => a.len() == b.len() && entries_eq(a, b),
        _ => false,
    }
}

fn entries_eq(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.iter()
        .all(|(key, x)| b.get(key).is_some_and(|y| literal_eq(x, y)))
}
