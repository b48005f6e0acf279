use std::path::PathBuf;

use axum::extract::{Path as UrlPath, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::pipeline::IndexDirectoryOptions;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IndexRequest {
    pub directory: String,
    #[serde(default)]
    pub force: bool,
    pub workers: Option<usize>,
    #[serde(default)]
    pub include_all_files: bool,
}

pub async fn index_directory(State(state): State<AppState>, Json(req): Json<IndexRequest>) -> AppResult<Json<serde_json::Value>> {
    if req.directory.trim().is_empty() {
        return Err(AppError::InvariantViolation("directory is required".into()));
    }
    let root = PathBuf::from(&req.directory);
    let opts = IndexDirectoryOptions { force: req.force, include_all_files: req.include_all_files, workers: req.workers, session: None, cancel: None };
    let summary = state.pipeline.index_directory(&root, opts).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "indexed_files": summary.indexed_files,
        "total_files": summary.total_files,
        "processing_time": summary.processing_time,
    })))
}

pub async fn index_stream(State(state): State<AppState>, Json(req): Json<IndexRequest>) -> AppResult<Json<serde_json::Value>> {
    if req.directory.trim().is_empty() {
        return Err(AppError::InvariantViolation("directory is required".into()));
    }
    let session = state.progress.start_session();
    let session_id = session.id;
    let root = PathBuf::from(&req.directory);
    let pipeline = state.pipeline.clone();
    let opts = IndexDirectoryOptions { force: req.force, include_all_files: req.include_all_files, workers: req.workers, session: Some(session), cancel: None };

    tokio::spawn(async move {
        if let Err(e) = pipeline.index_directory(&root, opts).await {
            tracing::warn!("background index_directory failed: {e}");
        }
    });

    Ok(Json(serde_json::json!({
        "session_id": session_id,
        "progress_url": format!("/index/progress/{session_id}"),
    })))
}

pub async fn current_progress(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::to_value(state.progress.current_snapshot()).unwrap_or_default())
}

pub async fn session_progress(State(state): State<AppState>, UrlPath(session_id): UrlPath<Uuid>) -> AppResult<Json<serde_json::Value>> {
    let session = state.progress.get(session_id).ok_or_else(|| AppError::ResourceUnavailable(format!("unknown session {session_id}")))?;
    Ok(Json(serde_json::to_value(session.snapshot())?))
}

#[derive(Debug, Deserialize)]
pub struct DeleteIndexQuery {
    #[serde(default)]
    pub confirm: bool,
}

pub async fn delete_index(State(state): State<AppState>, axum::extract::Query(q): axum::extract::Query<DeleteIndexQuery>) -> AppResult<Json<serde_json::Value>> {
    if !q.confirm {
        return Err(AppError::InvariantViolation("pass ?confirm=true to delete the index".into()));
    }
    for row in state.store.list_all() {
        state.store.remove(&row.path).await?;
    }
    Ok(Json(serde_json::json!({ "success": true })))
}
