//! # provgate-api: HTTP Boundary
//!
//! Axum application for the upload gatekeeper.
//!
//! ## Routes
//!
//! - `PUT /upload`: store the raw archive body and check its manifests.
//!   `200 OK`, `400 Bad Request`, `408 Request Timeout` when the body
//!   stalls, or `500 Internal Server Error`.
//! - `GET /`: static greeting.
//! - `GET /health/liveness`: always `ok`.
//! - everything else: `404 Not Found`.
//!
//! No business logic lives in handlers; they delegate to
//! [`provgate_pipeline::UploadPipeline`].

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::timeout::RequestBodyTimeoutLayer;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::AppState;

/// Assemble the application router.
///
/// Request bodies are wrapped in an idle timeout of
/// [`AppState::request_timeout`]; the upload handler turns its expiry into
/// a 408.
pub fn app(state: AppState) -> Router {
    let body_timeout = RequestBodyTimeoutLayer::new(state.request_timeout);
    Router::new()
        .merge(routes::home::router())
        .merge(routes::upload::router())
        .route("/health/liveness", get(liveness))
        .fallback(routes::not_found)
        .layer(body_timeout)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health/liveness
async fn liveness() -> &'static str {
    "ok"
}
