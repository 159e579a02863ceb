//! Pluggable table of extension predicates.
//!
//! Predicates are pure functions of `(message value, specification object)`
//! and must fail closed: anything they do not understand is a non-match.
//! New predicates are added with [`ExtensionRegistry::register`]; the
//! matcher's recursion never changes.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use serde_json::{Map, Value};

use super::extensions::{case_insensitive, geojson};
use super::spec::ExtensionCall;

/// A named comparison invoked through the `__match__` key.
pub trait Predicate: Send + Sync {
    /// Returns `true` if `value` satisfies the specification object `spec`.
    fn evaluate(&self, value: &Value, spec: &Map<String, Value>) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(&Value, &Map<String, Value>) -> bool + Send + Sync,
{
    fn evaluate(&self, value: &Value, spec: &Map<String, Value>) -> bool {
        self(value, spec)
    }
}

static BUILTIN: LazyLock<Arc<ExtensionRegistry>> =
    LazyLock::new(|| Arc::new(ExtensionRegistry::builtin()));

/// Name → predicate mapping consulted by the matcher.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    predicates: HashMap<String, Arc<dyn Predicate>>,
}

impl ExtensionRegistry {
    /// Creates a registry with no predicates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in predicates:
    /// `case-insensitive` (also under its legacy name
    /// `case-insensitive-match`) and `geojson-within`.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register(case_insensitive::NAME, case_insensitive::case_insensitive)
            .register(
                case_insensitive::LEGACY_NAME,
                case_insensitive::case_insensitive,
            )
            .register(geojson::WITHIN_NAME, geojson::geojson_within);
        registry
    }

    /// Process-wide shared copy of [`ExtensionRegistry::builtin`].
    #[must_use]
    pub fn shared_builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN)
    }

    /// Registers `predicate` under `name`, replacing any previous entry.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        predicate: impl Predicate + 'static,
    ) -> &mut Self {
        self.predicates.insert(name.into(), Arc::new(predicate));
        self
    }

    /// Returns `true` if a predicate is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.predicates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Runs the predicate named by `call` against `value`. Unknown or
    /// missing names never match.
    pub(crate) fn evaluate(&self, call: &ExtensionCall, value: &Value) -> bool {
        let Some(name) = call.name() else {
            tracing::debug!("extension name is not a string");
            return false;
        };
        match self.predicates.get(name) {
            Some(predicate) => predicate.evaluate(value, call.args()),
            None => {
                tracing::debug!(extension = name, "unknown extension predicate");
                false
            }
        }
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("predicates", &self.names())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::matcher::spec::{MatchSpec, SpecValue};

    fn call(text: &str) -> ExtensionCall {
        let Ok(spec) = MatchSpec::parse(text) else {
            panic!("spec should parse");
        };
        match spec.fields().first() {
            Some((_, SpecValue::Extension(call))) => call.clone(),
            other => panic!("expected extension, got {other:?}"),
        }
    }

    #[test]
    fn builtin_names() {
        let registry = ExtensionRegistry::builtin();
        let expected = [
            "case-insensitive",
            "case-insensitive-match",
            "geojson-within",
        ];
        assert_eq!(registry.names(), expected);
    }

    #[test]
    fn unknown_name_fails_closed() {
        let registry = ExtensionRegistry::builtin();
        let call = call(r#"{"k": {"__match__": "regex", "value": ".*"}}"#);
        assert!(!registry.evaluate(&call, &serde_json::json!("anything")));
    }

    #[test]
    fn closures_register_as_predicates() {
        let mut registry = ExtensionRegistry::new();
        registry.register("positive", |value: &Value, _: &Map<String, Value>| {
            value.as_f64().is_some_and(|n| n > 0.0)
        });
        let call = call(r#"{"k": {"__match__": "positive"}}"#);
        assert!(registry.evaluate(&call, &serde_json::json!(3)));
        assert!(!registry.evaluate(&call, &serde_json::json!(-3)));
        assert!(registry.contains("positive"));
    }

    #[test]
    fn shared_builtin_is_shared() {
        let a = ExtensionRegistry::shared_builtin();
        let b = ExtensionRegistry::shared_builtin();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
