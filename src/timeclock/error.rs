use actix_web::{HttpResponse, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for the attendance core. Every failure is a typed value;
/// the engine never degrades an error into a default minute count.
#[derive(Debug, Error)]
pub enum TimeclockError {
    #[error("Invalid employee")]
    IdentityNotFound(u64),

    #[error("Invalid PIN")]
    InvalidCredential,

    #[error("Already clocked in (open session exists)")]
    AlreadyOpen,

    #[error("No clock-in found or already clocked out")]
    NoOpenSession,

    #[error("Invalid clock-in timestamp on record {0}")]
    InvalidTimestamp(u64),

    #[error("Already clocked in")]
    ConcurrencyConflict,

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl actix_web::ResponseError for TimeclockError {
    fn status_code(&self) -> StatusCode {
        match self {
            TimeclockError::IdentityNotFound(_) => StatusCode::NOT_FOUND,
            TimeclockError::InvalidCredential => StatusCode::UNAUTHORIZED,
            TimeclockError::AlreadyOpen => StatusCode::BAD_REQUEST,
            TimeclockError::NoOpenSession => StatusCode::BAD_REQUEST,
            TimeclockError::ConcurrencyConflict => StatusCode::CONFLICT,
            TimeclockError::InvalidTimestamp(_) | TimeclockError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "timeclock failure");
            // Internal detail stays in the log.
            return HttpResponse::InternalServerError().json(json!({
                "error": "Internal Server Error"
            }));
        }
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
