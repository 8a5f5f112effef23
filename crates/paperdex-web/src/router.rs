//! Axum router — maps URL paths to handlers.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{get_or_scrape, health, scrape, search, tools, topics};
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/scrape", post(scrape))
        .route("/search", post(search))
        .route("/get_or_scrape", post(get_or_scrape))
        .route("/topics", post(topics))
        .route("/tools", get(tools))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
