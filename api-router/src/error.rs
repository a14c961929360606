use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::AppError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize, Clone)]
pub enum ApiError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unprocessable document: {0}")]
    Unprocessable(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Internal server error")]
    InternalError,
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidCredentials => Self::InvalidCredentials,
            AppError::Forbidden => Self::Forbidden,
            AppError::AlreadyExists(msg) => Self::Conflict(msg),
            AppError::NotFound(msg) => Self::NotFound(msg),
            AppError::Validation(msg) => Self::ValidationError(msg),
            AppError::Extraction(msg) => Self::Unprocessable(msg),
            AppError::Storage(_) => {
                tracing::error!("Vector index write failed: {:?}", err);
                Self::Upstream("vector index write failed".to_string())
            }
            AppError::Retrieval(_) => {
                tracing::error!("Vector index query failed: {:?}", err);
                Self::Upstream("vector index query failed".to_string())
            }
            AppError::Generation(_) => {
                tracing::error!("Text service call failed: {:?}", err);
                Self::Upstream("text service call failed".to_string())
            }
            _ => {
                tracing::error!("Internal error: {:?}", err);
                Self::InternalError
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            // Credential refusals stay uniform; the body never says whether
            // the identity or the secret was wrong.
            Self::InvalidCredentials => (StatusCode::FORBIDDEN, "Invalid credentials".to_string()),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            Self::Conflict(message) => (StatusCode::CONFLICT, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::ValidationError(message) => (StatusCode::BAD_REQUEST, message),
            Self::Unprocessable(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            Self::Upstream(message) => (StatusCode::BAD_GATEWAY, message),
            Self::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = ErrorResponse {
            error: message,
            status: "error".to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[derive(Serialize, Debug)]
struct ErrorResponse {
    error: String,
    status: String,
}
