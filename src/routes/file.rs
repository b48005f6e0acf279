use std::path::PathBuf;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FileContentRequest {
    pub path: String,
}

pub async fn file_content(State(state): State<AppState>, Json(req): Json<FileContentRequest>) -> AppResult<Json<serde_json::Value>> {
    let body = state
        .store
        .get_body(&req.path)
        .ok_or_else(|| AppError::ResourceUnavailable(format!("no indexed body for {}", req.path)))?;
    Ok(Json(serde_json::json!({ "success": true, "path": req.path, "content": body })))
}

#[derive(Debug, Deserialize)]
pub struct DeleteFileRequest {
    pub path: String,
}

pub async fn delete_file(State(state): State<AppState>, Json(req): Json<DeleteFileRequest>) -> AppResult<Json<serde_json::Value>> {
    let removed = state.pipeline.remove_file(&PathBuf::from(&req.path)).await?;
    Ok(Json(serde_json::json!({ "success": removed })))
}

#[derive(Debug, Deserialize)]
pub struct RenameFileRequest {
    pub old_path: String,
    pub new_path: String,
}

pub async fn rename_file(State(state): State<AppState>, Json(req): Json<RenameFileRequest>) -> AppResult<Json<serde_json::Value>> {
    let renamed = state.store.rename(&req.old_path, &req.new_path).await?;
    Ok(Json(serde_json::json!({ "success": renamed })))
}
