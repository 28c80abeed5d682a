pub mod collector;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod handlers;
pub mod mapper;
pub mod models;
pub mod sink;
pub mod util;

use axum::{routing::any, Router};

/// Build the liveness router (used by main and tests). Every path answers 200.
pub fn build_app() -> Router {
    Router::new()
        .route("/", any(handlers::health::liveness))
        .fallback(handlers::health::liveness)
}
