//! Built-in extension predicates.
//!
//! Each submodule exposes its registration name(s) and a plain function
//! with the [`super::Predicate`] shape.

pub mod case_insensitive;
pub mod geojson;
