use anyhow::{anyhow, Result};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use staysearch_core::persist::{load_generation, IndexPaths};
use staysearch_core::{CorpusSource, Error as CoreError, IndexConfig, JsonCorpus, Measure, MeasureScores, SearchIndex};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Everything needed to stand up the service.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// JSON/JSONL listings; used for the initial build when no snapshot is given,
    /// and for every rebuild.
    pub corpus: Option<String>,
    /// Directory of a snapshot written by `indexer build`.
    pub index: Option<String>,
    pub index_config: IndexConfig,
    pub default_measure: Measure,
    pub default_k: usize,
    pub max_k: usize,
    pub admin_token: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<SearchIndex>,
    pub source: Option<Arc<dyn CorpusSource>>,
    pub default_measure: Measure,
    pub default_k: usize,
    pub max_k: usize,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let source: Option<Arc<dyn CorpusSource>> =
            config.corpus.as_ref().map(|p| Arc::new(JsonCorpus::new(p)) as Arc<dyn CorpusSource>);
        let index = match (&config.index, &source) {
            (Some(dir), _) => SearchIndex::from_snapshot(load_generation(&IndexPaths::new(dir))?),
            (None, Some(src)) => SearchIndex::build(src.as_ref(), config.index_config.clone())?,
            (None, None) => return Err(anyhow!("either an index snapshot or a corpus path is required")),
        };
        let info = index.info();
        tracing::info!(generation = info.generation, num_docs = info.num_docs, vocabulary_size = info.vocabulary_size, "index ready");
        Ok(Self {
            index: Arc::new(index),
            source,
            default_measure: config.default_measure,
            default_k: config.default_k.max(1),
            max_k: config.max_k.max(1),
            admin_token: config.admin_token.clone(),
        })
    }
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default, alias = "q")]
    pub query: String,
    pub measure: Option<String>,
    pub k: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub measure: Measure,
    pub took_ms: u128,
    pub took_s: f64,
    pub total_matches: usize,
    pub query_terms: Vec<String>,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub score: f64,
    pub scores: MeasureScores,
}

#[derive(Serialize)]
pub struct TermWeight {
    pub term: String,
    pub weight: f64,
}

pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status = match &err {
            e if e.is_invalid_argument() => StatusCode::BAD_REQUEST,
            CoreError::Source(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, err.to_string())
    }
}

pub fn build_app(config: ServerConfig) -> Result<Router> {
    let state = AppState::from_config(&config)?;
    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_get).post(search_post))
        .route("/doc/:id", get(doc_handler))
        .route("/stats", get(stats_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn search_get(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    run_search(&state, params)
}

async fn search_post(State(state): State<AppState>, Json(params): Json<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    run_search(&state, params)
}

fn run_search(state: &AppState, params: SearchParams) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let k = params.k.unwrap_or(state.default_k).max(1).min(state.max_k);
    let found = match params.measure.as_deref() {
        Some(name) if !name.trim().is_empty() => state.index.search_named(&params.query, name.trim(), k)?,
        _ => state.index.search(&params.query, state.default_measure, k)?,
    };
    let measure = found.measure;

    let results = found
        .results
        .into_iter()
        .map(|r| SearchHit { id: r.id, name: r.display_name, score: r.score, scores: r.scores })
        .collect();
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.query,
        measure,
        took_ms: elapsed.as_millis(),
        took_s: elapsed.as_secs_f64(),
        total_matches: found.total_matches,
        query_terms: found.query_terms,
        results,
    }))
}

async fn doc_handler(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    let generation = state.index.snapshot();
    let row = generation
        .catalog()
        .row_of(&id)
        .ok_or_else(|| ApiError(StatusCode::NOT_FOUND, format!("listing {id} not indexed")))?;
    let terms: Vec<TermWeight> = generation
        .term_weights(row)
        .into_iter()
        .map(|(term, weight)| TermWeight { term: term.to_string(), weight })
        .collect();
    Ok(Json(serde_json::json!({
        "id": id,
        "name": generation.catalog().display_name(row),
        "terms": terms,
    })))
}

async fn stats_handler(State(state): State<AppState>) -> Json<staysearch_core::GenerationInfo> {
    Json(state.index.info())
}

async fn rebuild_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<staysearch_core::GenerationInfo>, ApiError> {
    authorize(&state, &headers)?;
    let source = state
        .source
        .clone()
        .ok_or_else(|| ApiError(StatusCode::CONFLICT, "no corpus source configured".into()))?;
    let index = state.index.clone();
    let info = tokio::task::spawn_blocking(move || index.rebuild(source.as_ref()))
        .await
        .map_err(|e| ApiError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))??;
    Ok(Json(info))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(ApiError(StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError(StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
