//! HTTP handlers — JSON in, enveloped JSON out.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use paperdex_engine::{EngineError, GetOrScrapeResults, ScrapeSummary, SearchResults};
use serde::{Deserialize, Serialize};

use crate::state::SharedState;

/// Default result count when the request omits `max_results`.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Default topic count when the request omits `limit`.
pub const DEFAULT_TOPIC_LIMIT: usize = 20;

// ── Request / response shapes ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TopicRequest {
    pub topic: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

#[derive(Debug, Deserialize)]
pub struct TopicsRequest {
    #[serde(default = "default_topic_limit")]
    pub limit: usize,
}

fn default_topic_limit() -> usize {
    DEFAULT_TOPIC_LIMIT
}

/// Uniform response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

fn error_status(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NoMatch => StatusCode::NOT_FOUND,
        EngineError::InvalidLimit => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(result: Result<T, EngineError>) -> (StatusCode, Json<ApiResponse<T>>) {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))),
        Err(e) => (error_status(&e), Json(ApiResponse::err(e.to_string()))),
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

pub async fn scrape(
    State(state): State<SharedState>,
    Json(req): Json<TopicRequest>,
) -> (StatusCode, Json<ApiResponse<ScrapeSummary>>) {
    respond(state.engine.scrape_and_store(&req.topic, req.max_results).await)
}

pub async fn search(
    State(state): State<SharedState>,
    Json(req): Json<TopicRequest>,
) -> (StatusCode, Json<ApiResponse<SearchResults>>) {
    respond(state.engine.search_stored(&req.topic, req.max_results).await)
}

pub async fn get_or_scrape(
    State(state): State<SharedState>,
    Json(req): Json<TopicRequest>,
) -> (StatusCode, Json<ApiResponse<GetOrScrapeResults>>) {
    respond(state.engine.get_or_scrape(&req.topic, req.max_results).await)
}

pub async fn topics(
    State(state): State<SharedState>,
    Json(req): Json<TopicsRequest>,
) -> (StatusCode, Json<ApiResponse<Vec<String>>>) {
    respond(state.engine.list_topics(req.limit).await)
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": "paperdex" }))
}

/// Tool descriptors for agent front-ends that discover capabilities
/// before calling them.
pub async fn tools() -> Json<serde_json::Value> {
    let topic_schema = serde_json::json!({
        "type": "object",
        "properties": {
            "topic": { "type": "string", "description": "The research topic to search for" },
            "max_results": { "type": "integer", "description": "Maximum number of results", "default": DEFAULT_MAX_RESULTS }
        },
        "required": ["topic"]
    });

    Json(serde_json::json!({
        "tools": [
            {
                "name": "scrape_papers",
                "description": "Scrapes papers for a given topic and stores them in the database",
                "inputSchema": topic_schema,
            },
            {
                "name": "search_stored_papers",
                "description": "Searches stored papers by topic similarity without refreshing",
                "inputSchema": topic_schema,
            },
            {
                "name": "get_or_scrape_papers",
                "description": "Serves papers from the database, scraping the live source if none match",
                "inputSchema": topic_schema,
            },
            {
                "name": "list_topics",
                "description": "Lists topics currently stored in the database",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "limit": { "type": "integer", "description": "Maximum number of topics", "default": DEFAULT_TOPIC_LIMIT }
                    },
                    "required": []
                },
            }
        ]
    }))
}
