use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for the indexing/search core.
///
/// `ResourceUnavailable` and `ParseFailure` are recorded per-item during a walk or batch
/// and never abort the surrounding operation; they only reach this type at the edges
/// (single-file entry points, HTTP handlers) where there is no batch to keep going.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("parse failure: {0}")]
    ParseFailure(String),

    #[error("scanned document, no extractable text: {0}")]
    ParseFailureLowYield(String),

    #[error("store failure: {0}")]
    StoreFailure(String),

    #[error("query failure: {0}")]
    QueryFailure(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::ResourceUnavailable(_) => StatusCode::NOT_FOUND,
            AppError::ParseFailure(_) | AppError::ParseFailureLowYield(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::StoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::QueryFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvariantViolation(_) => StatusCode::BAD_REQUEST,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Serde(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = json!({
            "success": false,
            "error": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
