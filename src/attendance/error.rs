use actix_web::{HttpResponse, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for the attendance core.
///
/// `Validation`, `NotFound` and `Conflict` are user-correctable and carry a
/// client-safe message. `Storage` wraps collaborator failures; its detail is
/// logged but never rendered to the client.
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl AttendanceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AttendanceError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AttendanceError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AttendanceError::Conflict(msg.into())
    }
}

impl From<sqlx::Error> for AttendanceError {
    fn from(err: sqlx::Error) -> Self {
        AttendanceError::Storage(err.to_string())
    }
}

impl actix_web::ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::Validation(_) => StatusCode::BAD_REQUEST,
            AttendanceError::NotFound(_) => StatusCode::NOT_FOUND,
            AttendanceError::Conflict(_) => StatusCode::CONFLICT,
            AttendanceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AttendanceError::Storage(detail) => {
                tracing::error!(error = %detail, "Attendance storage failure");
                HttpResponse::InternalServerError().json(json!({
                    "message": "Internal Server Error"
                }))
            }
            other => HttpResponse::build(self.status_code()).json(json!({
                "message": other.to_string()
            })),
        }
    }
}
