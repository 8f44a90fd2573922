//! HTTP API layer for inkwell.
//!
//! This crate provides the REST API and real-time streaming:
//!
//! - **Endpoints**: JSON-over-POST routes under `/api`
//! - **Extractors**: Authentication from the bearer credential
//! - **Middleware**: Application state and token resolution
//! - **Streaming**: WebSocket delivery of notifications
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod streaming;

use axum::{Router, http::Uri, routing::get};
use inkwell_common::AppError;
use tower_http::trace::TraceLayer;

pub use endpoints::router;
pub use middleware::AppState;
pub use streaming::streaming_handler;

/// Assemble the full application: `/api`, `/streaming` and `/healthz`,
/// behind token resolution and request tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/streaming", get(streaming_handler))
        .merge(endpoints::health_router())
        .nest("/api", router())
        .fallback(not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No endpoint at {}", uri.path()))
}
