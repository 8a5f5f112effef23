//! Shared application state for the web server.

use std::sync::Arc;

use paperdex_engine::RetrievalEngine;

/// Shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: RetrievalEngine,
}

pub type SharedState = Arc<AppState>;
