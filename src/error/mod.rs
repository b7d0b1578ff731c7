//! Application error types for robust error handling.
//!
//! Client errors carry a message that has already been translated for the
//! request locale; server errors are logged and reported generically.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input, bad credentials, rate limits, invalid reset tokens.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body is structurally unusable (e.g. no fields at all).
    #[error("Bad data: {0}")]
    BadData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint on `users.email`; handlers translate it.
    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Serialization(_) => StatusCode::BAD_REQUEST,
            AppError::BadData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::Redis(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Db(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client. Server errors get a generic one.
    pub fn public_message(&self) -> String {
        match self {
            AppError::BadRequest(msg) | AppError::BadData(msg) | AppError::NotFound(msg) => {
                msg.clone()
            }
            AppError::Serialization(e) => format!("Invalid payload: {}", e),
            AppError::DuplicateEmail => self.to_string(),
            AppError::Redis(_) | AppError::Db(_) | AppError::Internal(_) => {
                "An unexpected error occurred".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let message = self.public_message();

        let body = Json(json!({
            "statusCode": status.as_u16(),
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": message,
        }));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
