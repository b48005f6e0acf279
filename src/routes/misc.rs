use axum::extract::State;
use axum::Json;

use crate::config::SUPPORTED_EXTENSIONS;
use crate::state::AppState;

pub async fn stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.store.stats();
    Json(serde_json::json!({ "success": true, "stats": stats }))
}

pub async fn supported_formats() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "formats": SUPPORTED_EXTENSIONS }))
}
