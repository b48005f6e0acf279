use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::routes;
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/shutdown", post(routes::health::shutdown_handler))
        .route("/search", post(routes::search::search))
        .route("/search/advanced", post(routes::search::search_advanced))
        .route("/search/metadata", post(routes::search::search_metadata))
        .route("/search/combined", post(routes::search::search_combined))
        .route("/suggest", get(routes::search::suggest))
        .route("/index", post(routes::index::index_directory))
        .route("/index", delete(routes::index::delete_index))
        .route("/index/stream", post(routes::index::index_stream))
        .route("/api/indexing/progress", get(routes::index::current_progress))
        .route("/index/progress/{session_id}", get(routes::index::session_progress))
        .route("/file/content", post(routes::file::file_content))
        .route("/file", delete(routes::file::delete_file))
        .route("/file/path", put(routes::file::rename_file))
        .route("/stats", get(routes::misc::stats))
        .route("/supported-formats", get(routes::misc::supported_formats))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
