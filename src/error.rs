use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::calendar::UnknownWeekday;
use crate::import::ImportError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    UnknownWeekday(#[from] UnknownWeekday),

    #[error("Error processing file {file_name}: {source}")]
    Import {
        file_name: String,
        #[source]
        source: ImportError,
    },

    #[error("Internal server error")]
    InternalServerError,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::UnknownWeekday(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            AppError::Import { file_name, source } => {
                let message = format!("Error processing file {}: {}", file_name, source);
                if source.is_malformed_input() {
                    (StatusCode::UNPROCESSABLE_ENTITY, message)
                } else {
                    error!("{}", message);
                    (StatusCode::INTERNAL_SERVER_ERROR, message)
                }
            }
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}
