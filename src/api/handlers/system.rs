//! System endpoints: health check and extension catalog.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{ExtensionListResponse, HealthResponse};
use crate::app_state::AppState;

/// `GET /health` — Service health status.
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /config/extensions` — Names usable as `__match__` values.
pub async fn extensions_handler(State(state): State<AppState>) -> impl IntoResponse {
    let extensions = state
        .registry
        .names()
        .into_iter()
        .map(str::to_owned)
        .collect();
    (StatusCode::OK, Json(ExtensionListResponse { extensions }))
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/extensions", get(extensions_handler))
}
