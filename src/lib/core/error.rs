use std::time::Duration;

use axum::{http::StatusCode, response::IntoResponse};
use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
    #[error("Database call timed out after {0:?}")]
    Timeout(Duration),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

// Constraint violations are caller-input problems, everything else from the
// driver is infrastructure.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            match db_err.kind() {
                ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation
                | ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation => {
                    return AppError::Validation(db_err.message().to_string());
                }
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Template(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }
        match self {
            AppError::NotFound(msg) | AppError::Validation(msg) => (status, msg).into_response(),
            // driver and template details stay in the log
            _ => (status, status.canonical_reason().unwrap_or("Server error")).into_response(),
        }
    }
}
