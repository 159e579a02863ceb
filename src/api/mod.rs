//! HTTP layer: route handlers, DTOs, and router composition.
//!
//! `GET /` and `POST /` are the hub itself (subscribe over SSE, publish);
//! system endpoints sit alongside at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Builds the router with all endpoints, still expecting its state.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the complete application: routes, tracing and CORS layers, and
/// state.
pub fn build_app(state: AppState) -> Router {
    build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
