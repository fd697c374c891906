//! HTTP front end: one HTML page plus a JSON search API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::search::{year_distribution, ScoredPaper, SearchEngine, YearCount};

pub const MIN_TOP_K: usize = 3;
pub const MAX_TOP_K: usize = 25;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub default_top_k: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub top_k: usize,
    pub results: Vec<ScoredPaper>,
    pub year_distribution: Vec<YearCount>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub papers: usize,
    pub vocab: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody { error: message.into() }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ui))
        .route("/api/search", get(api_search))
        .route("/api/health", get(api_health))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(engine: Arc<SearchEngine>, config: &ServerConfig) -> std::io::Result<()> {
    let bind_addr: SocketAddr = config
        .bind
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let state = AppState {
        engine,
        default_top_k: config.default_top_k,
    };

    tracing::info!("listening on http://{}", bind_addr);
    axum::serve(tokio::net::TcpListener::bind(bind_addr).await?, router(state)).await
}

async fn ui() -> Html<&'static str> {
    Html(include_str!("ui.html"))
}

async fn api_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        papers: state.engine.corpus_size(),
        vocab: state.engine.vocab_size(),
    })
}

async fn api_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.q.unwrap_or_default().trim().to_string();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "query parameter `q` is required"));
    }
    let top_k = params
        .top_k
        .unwrap_or(state.default_top_k)
        .clamp(MIN_TOP_K, MAX_TOP_K);

    // scoring is CPU bound, keep it off the async workers
    let engine = Arc::clone(&state.engine);
    let q = query.clone();
    let results = tokio::task::spawn_blocking(move || engine.search(&q, top_k))
        .await
        .map_err(|e| {
            tracing::error!("search task failed: {:?}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "search failed")
        })?
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    tracing::debug!(query = %query, top_k, hits = results.len(), "api search");
    Ok(Json(SearchResponse {
        query,
        top_k,
        year_distribution: year_distribution(&results),
        results,
    }))
}
