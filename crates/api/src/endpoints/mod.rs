//! API endpoints.

mod account;
mod auth;
mod blogs;
mod comments;
mod following;
mod health;
mod notifications;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router, to be nested under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/i", account::router())
        .nest("/users", users::router())
        .nest("/following", following::router())
        .nest("/blogs", blogs::router())
        .nest("/comments", comments::router())
        .nest("/notifications", notifications::router())
}

/// Routes served outside `/api`.
pub fn health_router() -> Router<AppState> {
    health::router()
}
