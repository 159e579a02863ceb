//! Subscribe (SSE) and publish handlers for the root exchange.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;

use crate::api::dto::HubParams;
use crate::app_state::AppState;
use crate::domain::{ClientPool, ClientSink, Message, PoolOptions, Publisher};
use crate::error::HubError;
use crate::matcher::Matcher;
use crate::sse::{ClientStream, DetachGuard};

/// `GET /` — Subscribe with a match specification.
///
/// Builds a pool from `q` (or the body), subscribes it to the root
/// exchange, attaches this connection as its client and streams matched
/// messages as SSE frames until the client disconnects.
///
/// # Errors
///
/// Returns [`HubError::InvalidSpec`] for a malformed specification and
/// [`HubError::InvalidRequest`] for an unknown `dm`.
pub async fn subscribe_handler(
    State(state): State<AppState>,
    Query(params): Query<HubParams>,
    body: String,
) -> Result<Response, HubError> {
    let spec = params.text_or(body);
    let options = PoolOptions {
        ping_only: params.ping_only(),
        dist_method: params.dist_method()?,
        capacity: state.config.pool_capacity,
        matcher: Matcher::with_registry(Arc::clone(&state.registry)),
    };

    let parent: Arc<dyn Publisher> = Arc::new(state.exchange.clone());
    let pool = ClientPool::with_options(parent, &spec, options)?;
    state.exchange.subscribe(Arc::new(pool.clone()));

    let (sink, rx) = ClientSink::channel(state.config.client_buffer);
    let client = sink.id();
    let guard = DetachGuard::new(pool.clone(), state.exchange.clone(), client);
    pool.attach(sink).await?;
    tracing::info!(
        pool_id = %pool.id(),
        client_id = %client,
        ping_only = pool.ping_only(),
        "client subscribed"
    );

    let sse = Sse::new(ClientStream::new(rx, guard));
    let response = match state.config.sse_keep_alive {
        Some(interval) => {
            let keep_alive = KeepAlive::new().interval(interval);
            sse.keep_alive(keep_alive).into_response()
        }
        None => sse.into_response(),
    };
    Ok(response)
}

/// `POST /` — Publish `q` (or the body) to the root exchange.
///
/// The text is not validated; publishing is best effort and the reply is
/// the same whether or not the message was accepted.
pub async fn publish_handler(
    State(state): State<AppState>,
    Query(params): Query<HubParams>,
    body: String,
) -> impl IntoResponse {
    let message = Message::new(params.text_or(body));
    tracing::debug!(bytes = message.raw().len(), "publish");
    state.exchange.publish(message);
    (StatusCode::OK, "Sent")
}

/// Hub routes mounted at the root path.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(subscribe_handler).post(publish_handler))
}
