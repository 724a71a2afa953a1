use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::services::ServiceError;

/// Every failure a handler can report, mapped onto the JSON error envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BusinessRule(String),
    #[error("{context}: {message}")]
    Integration { context: String, message: String },
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("Database connection failed: {0}")]
    Connection(#[from] diesel::result::ConnectionError),
}

impl ApiError {
    pub fn integration(context: &str, err: ServiceError) -> Self {
        ApiError::Integration {
            context: context.to_string(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": "Validation failed", "details": details }),
            ),
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "error": message }),
            ),
            ApiError::BusinessRule(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": message }),
            ),
            ApiError::Integration { context, message } => {
                log::error!("{}: {}", context, message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "error": context, "details": message }),
                )
            }
            ApiError::Database(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            )) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": "Duplicate value", "details": "This record already exists" }),
            ),
            ApiError::Database(e) => {
                log::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "error": "Internal server error" }),
                )
            }
            ApiError::Connection(e) => {
                log::error!("Database connection failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "error": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
