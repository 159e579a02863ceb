//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::HubConfig;
use crate::domain::Exchange;
use crate::matcher::ExtensionRegistry;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Root exchange every HTTP subscription and publish targets.
    pub exchange: Exchange,
    /// Extension predicates available to match specifications.
    pub registry: Arc<ExtensionRegistry>,
    /// Runtime configuration.
    pub config: Arc<HubConfig>,
}

impl AppState {
    /// Builds the state and spawns the root exchange. Must be called from
    /// within a Tokio runtime.
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        Self {
            exchange: Exchange::new(config.exchange_capacity),
            registry: ExtensionRegistry::shared_builtin(),
            config: Arc::new(config),
        }
    }
}
