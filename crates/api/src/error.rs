use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use doccheck_checker::CheckerError;
use doccheck_core::error::CoreError;
use doccheck_notify::EmailError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain errors and adds HTTP-specific variants. Every variant
/// renders as `{ "success": false, "data": { "message", "code" } }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Checker(#[from] CheckerError),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// The remote site answered with an error for a single-item check.
    #[error("{0}")]
    Remote(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

fn internal(err: &dyn std::fmt::Display) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => internal(msg),
            },

            AppError::Checker(err) => match err {
                CheckerError::InvalidItem(_) => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    "Invalid item ID.".to_string(),
                ),
                CheckerError::InvalidCollection => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    err.to_string(),
                ),
                CheckerError::Source(source) => {
                    tracing::warn!(error = %source, "Remote API request failed");
                    (StatusCode::BAD_GATEWAY, "REMOTE_ERROR", source.to_string())
                }
                CheckerError::Database(db) => internal(db),
                CheckerError::Settings(e) => internal(e),
            },

            AppError::Email(err) => match err {
                EmailError::Address(_) | EmailError::Build(_) => {
                    (StatusCode::BAD_REQUEST, "EMAIL_ERROR", err.to_string())
                }
                _ => {
                    tracing::warn!(error = %err, "Email delivery failed");
                    (StatusCode::BAD_GATEWAY, "EMAIL_ERROR", err.to_string())
                }
            },

            AppError::Database(err) => match err {
                sqlx::Error::RowNotFound => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "Resource not found".to_string(),
                ),
                other => internal(other),
            },

            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                errors.to_string(),
            ),

            AppError::Remote(msg) => (StatusCode::BAD_GATEWAY, "REMOTE_ERROR", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => internal(msg),
        };

        let body = json!({
            "success": false,
            "data": {
                "message": message,
                "code": code,
            },
        });

        (status, axum::Json(body)).into_response()
    }
}
