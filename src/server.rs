//! Glossary JSON HTTP API.
//!
//! Serves the synced snapshot to the site front end. Every handler reads
//! the store through the [`Store`] trait, so the router can run against
//! SQLite in production and an in-memory store in tests.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Health check (returns version) |
//! | `GET` | `/api/terms?q=&category=&difficulty=&limit=` | Ranked keyword search |
//! | `GET` | `/api/terms/{id_or_slug}` | Term detail with breadcrumb and related terms |
//! | `GET` | `/api/categories/tree` | Category forest with attached terms |
//! | `GET` | `/api/terms-by-category/{category_id}` | Terms of one category |
//! | `GET` | `/api/index` | Non-empty A–Z / 0-9 groups |
//! | `GET` | `/api/index/{key}` | One index group |
//! | `GET` | `/api/recommended-terms?limit=` | Recommended terms |
//! | `GET` | `/sitemap.xml` | XML sitemap |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "term not found: dns" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a separately hosted
//! front end can call the API.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use glossary_core::alphabet::IndexGroup;
use glossary_core::models::Term;
use glossary_core::store::Store;
use glossary_core::tree::CategoryNode;

use crate::categories::{category_terms, category_tree, CategoryTerms};
use crate::config::Config;
use crate::errors::LookupError;
use crate::get::{get_term_detail, TermDetail};
use crate::index::{alphabet_index, index_group};
use crate::recommended::recommended;
use crate::search::{search_terms, SearchQuery, SearchResponse};
use crate::sitemap::build_sitemap;
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}

/// Build the router with all routes and CORS.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/terms", get(handle_search))
        .route("/api/terms/{id_or_slug}", get(handle_get_term))
        .route("/api/categories/tree", get(handle_tree))
        .route(
            "/api/terms-by-category/{category_id}",
            get(handle_terms_by_category),
        )
        .route("/api/index", get(handle_index))
        .route("/api/index/{key}", get(handle_index_group))
        .route("/api/recommended-terms", get(handle_recommended))
        .route("/sitemap.xml", get(handle_sitemap))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server.
///
/// Binds to the address configured in `[server].bind` and runs until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let store = SqliteStore::connect(config).await?;
    let state = AppState::new(config.clone(), Arc::new(store));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "server listening");
    println!("Glossary server listening on http://{}", bind_addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: message.into(),
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<LookupError>() {
            Some(lookup) if lookup.is_not_found() => not_found(lookup.to_string()),
            Some(lookup) => bad_request(lookup.to_string()),
            None => {
                tracing::error!(error = %format!("{:#}", err), "request failed");
                internal(err.to_string())
            }
        }
    }
}

type ApiResult<T> = Result<Json<T>, AppError>;

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/terms ============

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

async fn handle_search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<SearchResponse> {
    let Query(params) = params.map_err(|e| bad_request(e.body_text()))?;
    if params.limit == Some(0) {
        return Err(bad_request("limit must be >= 1"));
    }
    let request = SearchQuery {
        query: params.q.unwrap_or_default(),
        category: params.category,
        difficulty: params.difficulty,
        limit: params.limit,
    };
    let response =
        search_terms(state.store.as_ref(), &request, state.config.search.final_limit).await?;
    Ok(Json(response))
}

// ============ GET /api/terms/{id_or_slug} ============

async fn handle_get_term(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> ApiResult<TermDetail> {
    Ok(Json(get_term_detail(state.store.as_ref(), &id_or_slug).await?))
}

// ============ GET /api/categories/tree ============

#[derive(Serialize)]
struct TreeResponse {
    categories: Vec<CategoryNode>,
}

async fn handle_tree(State(state): State<AppState>) -> ApiResult<TreeResponse> {
    let categories =
        category_tree(state.store.as_ref(), &state.config.tree_options(), true).await?;
    Ok(Json(TreeResponse { categories }))
}

// ============ GET /api/terms-by-category/{category_id} ============

async fn handle_terms_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> ApiResult<CategoryTerms> {
    Ok(Json(category_terms(state.store.as_ref(), &category_id).await?))
}

// ============ GET /api/index ============

#[derive(Serialize)]
struct IndexResponse {
    groups: Vec<IndexGroup>,
    unindexed: usize,
}

async fn handle_index(State(state): State<AppState>) -> ApiResult<IndexResponse> {
    let index = alphabet_index(state.store.as_ref()).await?;
    let unindexed = index.unindexed;
    let groups = index
        .groups
        .into_iter()
        .filter(|g| !g.terms.is_empty())
        .collect();
    Ok(Json(IndexResponse { groups, unindexed }))
}

async fn handle_index_group(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<IndexGroup> {
    Ok(Json(index_group(state.store.as_ref(), &key).await?))
}

// ============ GET /api/recommended-terms ============

#[derive(Debug, Deserialize)]
struct RecommendedParams {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct RecommendedResponse {
    terms: Vec<Term>,
}

async fn handle_recommended(
    State(state): State<AppState>,
    params: Result<Query<RecommendedParams>, QueryRejection>,
) -> ApiResult<RecommendedResponse> {
    let Query(params) = params.map_err(|e| bad_request(e.body_text()))?;
    let limit = params
        .limit
        .unwrap_or(state.config.search.recommended_limit);
    if limit == 0 {
        return Err(bad_request("limit must be >= 1"));
    }
    let terms = recommended(state.store.as_ref(), limit).await?;
    Ok(Json(RecommendedResponse { terms }))
}

// ============ GET /sitemap.xml ============

async fn handle_sitemap(State(state): State<AppState>) -> Result<Response, AppError> {
    let xml = build_sitemap(state.store.as_ref(), &state.config.server.site_url).await?;
    Ok(([(header::CONTENT_TYPE, "application/xml")], xml).into_response())
}
