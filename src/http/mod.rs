//! HTTP surface: the customer submission endpoints, each guarded by the
//! rate limiter before anything is written.

mod client_ip;
mod error;
mod handlers;
mod server;

use axum::routing::{get, post};
use axum::Router;

pub use client_ip::{ClientIp, TrustedProxies};
pub use error::ApiError;
pub use handlers::AppState;
pub use server::HttpServer;

/// Build the router for every endpoint.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/reviews",
            get(handlers::list_reviews).post(handlers::create_review),
        )
        .route("/api/inquiries", post(handlers::create_inquiry))
        .route(
            "/api/callback-requests",
            post(handlers::create_callback_request),
        )
        .with_state(state)
}
