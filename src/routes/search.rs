use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::query::SearchType;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_search_type")]
    pub search_type: SearchType,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_min_fuzzy_score")]
    pub min_fuzzy_score: f32,
    pub file_types: Option<Vec<String>>,
}

fn default_search_type() -> SearchType {
    SearchType::Exact
}
fn default_limit() -> usize {
    50
}
fn default_min_fuzzy_score() -> f32 {
    crate::config::DEFAULT_MIN_FUZZY_SCORE
}

pub async fn search(State(state): State<AppState>, Json(req): Json<SearchRequest>) -> AppResult<Json<serde_json::Value>> {
    if req.limit > 1000 {
        return Err(AppError::InvariantViolation("limit must be <= 1000".into()));
    }
    let response = state.query_engine.search(
        &req.query,
        req.search_type,
        req.limit,
        req.min_fuzzy_score,
        req.file_types.as_deref(),
    )?;
    Ok(Json(serde_json::to_value(response)?))
}

#[derive(Debug, Deserialize)]
pub struct AdvancedSearchRequest {
    pub content: Option<String>,
    pub path: Option<String>,
    pub file_types: Option<Vec<String>>,
    #[serde(default)]
    pub fuzzy: bool,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

pub async fn search_advanced(State(state): State<AppState>, Json(req): Json<AdvancedSearchRequest>) -> AppResult<Json<serde_json::Value>> {
    let results = state.query_engine.search_advanced(
        req.content.as_deref(),
        req.path.as_deref(),
        req.file_types.as_deref(),
        req.fuzzy,
        req.limit,
    )?;
    Ok(Json(serde_json::json!({
        "success": true,
        "results": results,
        "total_results": results.len(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct MetadataSearchRequest {
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    pub min_created_at: Option<i64>,
    pub max_created_at: Option<i64>,
    pub file_types: Option<Vec<String>>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl From<&MetadataSearchRequest> for crate::store::MetadataFilter {
    fn from(r: &MetadataSearchRequest) -> Self {
        crate::store::MetadataFilter {
            min_size: r.min_size,
            max_size: r.max_size,
            min_created_at: r.min_created_at,
            max_created_at: r.max_created_at,
            file_types: r.file_types.clone(),
        }
    }
}

pub async fn search_metadata(State(state): State<AppState>, Json(req): Json<MetadataSearchRequest>) -> Json<serde_json::Value> {
    let filter = crate::store::MetadataFilter::from(&req);
    let results = state.query_engine.search_metadata(&filter, req.limit);
    Json(serde_json::json!({
        "success": true,
        "results": results,
        "total_results": results.len(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CombinedSearchRequest {
    pub content: Option<String>,
    pub path: Option<String>,
    #[serde(flatten)]
    pub metadata: MetadataSearchRequest,
}

pub async fn search_combined(State(state): State<AppState>, Json(req): Json<CombinedSearchRequest>) -> AppResult<Json<serde_json::Value>> {
    let filter = crate::store::MetadataFilter::from(&req.metadata);
    let results = state.query_engine.search_combined(&filter, req.content.as_deref(), req.path.as_deref(), req.metadata.limit)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "results": results,
        "total_results": results.len(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    pub query: String,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

fn default_max_suggestions() -> usize {
    5
}

pub async fn suggest(State(state): State<AppState>, axum::extract::Query(req): axum::extract::Query<SuggestRequest>) -> Json<serde_json::Value> {
    let suggestions = state.query_engine.suggest(&req.query, req.max_suggestions);
    Json(serde_json::json!({ "success": true, "suggestions": suggestions }))
}
