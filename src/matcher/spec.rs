//! Compiled match specifications.
//!
//! A [`MatchSpec`] is parsed once, when a pool is built, and reused for
//! every message the pool sees. Each field becomes a [`SpecValue`], which
//! makes the three comparison modes explicit instead of re-inspecting JSON
//! types on every match.

use serde_json::{Map, Value};

/// Reserved key that turns a specification object into an extension call.
pub const EXTENSION_KEY: &str = "__match__";

/// Errors raised while compiling a match specification.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    /// The text is not valid JSON.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The text is valid JSON but not an object.
    #[error("match specification must be a JSON object")]
    NotAnObject,
}

/// One constraint in a match specification.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecValue {
    /// Delegate to a named extension predicate.
    Extension(ExtensionCall),
    /// The message value must be an object satisfying the nested spec.
    Object(MatchSpec),
    /// The message value must have the same JSON type and an equal value.
    Literal(Value),
}

/// A `{"__match__": "<name>", ...}` object from a specification.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionCall {
    name: Option<String>,
    args: Map<String, Value>,
}

impl ExtensionCall {
    /// Name of the predicate, or `None` when `__match__` is not a string.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The whole specification object, `__match__` key included.
    #[must_use]
    pub fn args(&self) -> &Map<String, Value> {
        &self.args
    }
}

/// A parsed filter tree. Every field must be satisfied for a match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchSpec {
    fields: Vec<(String, SpecValue)>,
}

impl MatchSpec {
    /// Parses and compiles specification text.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Json`] for malformed JSON and
    /// [`SpecError::NotAnObject`] when the top level is not an object.
    pub fn parse(text: &str) -> Result<Self, SpecError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Compiles an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::NotAnObject`] when `value` is not an object.
    pub fn from_value(value: Value) -> Result<Self, SpecError> {
        match value {
            Value::Object(map) => Ok(Self::compile(map)),
            _ => Err(SpecError::NotAnObject),
        }
    }

    fn compile(map: Map<String, Value>) -> Self {
        let fields = map
            .into_iter()
            .map(|(key, value)| (key, SpecValue::compile(value)))
            .collect();
        Self { fields }
    }

    /// Compiled fields in specification order.
    #[must_use]
    pub fn fields(&self) -> &[(String, SpecValue)] {
        &self.fields
    }

    /// Returns `true` if the specification has no constraints and so
    /// matches any JSON object.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl SpecValue {
    fn compile(value: Value) -> Self {
        match value {
            Value::Object(map) if map.contains_key(EXTENSION_KEY) => {
                let name = map
                    .get(EXTENSION_KEY)
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                Self::Extension(ExtensionCall { name, args: map })
            }
            Value::Object(map) => Self::Object(MatchSpec::compile(map)),
            other => Self::Literal(other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn parse(text: &str) -> MatchSpec {
        let Ok(spec) = MatchSpec::parse(text) else {
            panic!("spec should parse: {text}");
        };
        spec
    }

    #[test]
    fn empty_object_is_empty_spec() {
        assert!(parse("{}").is_empty());
    }

    #[test]
    fn malformed_json_is_rejected() {
        let result = MatchSpec::parse("{not json");
        assert!(matches!(result, Err(SpecError::Json(_))));
    }

    #[test]
    fn non_object_is_rejected() {
        for text in ["[1, 2]", "\"x\"", "42"] {
            let result = MatchSpec::parse(text);
            assert!(matches!(result, Err(SpecError::NotAnObject)), "{text}");
        }
    }

    #[test]
    fn compiles_each_kind() {
        let spec = parse(
            r#"{
                "a": 1,
                "b": {"c": "d"},
                "e": {"__match__": "case-insensitive", "value": "X"}
            }"#,
        );
        assert_eq!(spec.fields().len(), 3);
        for (key, value) in spec.fields() {
            match (key.as_str(), value) {
                ("a", SpecValue::Literal(v)) => assert_eq!(*v, serde_json::json!(1)),
                ("b", SpecValue::Object(nested)) => assert_eq!(nested.fields().len(), 1),
                ("e", SpecValue::Extension(call)) => {
                    assert_eq!(call.name(), Some("case-insensitive"));
                    assert_eq!(call.args().get("value"), Some(&serde_json::json!("X")));
                }
                other => panic!("unexpected field {other:?}"),
            }
        }
    }

    #[test]
    fn non_string_extension_name_has_no_name() {
        let spec = parse(r#"{"a": {"__match__": 7}}"#);
        let Some((_, SpecValue::Extension(call))) = spec.fields().first() else {
            panic!("expected extension call");
        };
        assert_eq!(call.name(), None);
    }
}
