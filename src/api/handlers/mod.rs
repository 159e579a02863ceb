//! HTTP endpoint handlers.

pub mod hub;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Hub routes: subscribe and publish on the root path.
pub fn routes() -> Router<AppState> {
    hub::routes()
}
