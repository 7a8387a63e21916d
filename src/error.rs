use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;
use tracing::error;

/// Workflow error kinds. Persistence detail is logged server-side and
/// never returned to the caller.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    NotImplemented(String),

    #[error("persistence failure")]
    Persistence(#[from] sqlx::Error),
}

impl TransferError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            TransferError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            TransferError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            TransferError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            TransferError::NotImplemented(_) => (StatusCode::NOT_IMPLEMENTED, "NOT_IMPLEMENTED"),
            TransferError::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl ResponseError for TransferError {
    fn status_code(&self) -> StatusCode {
        self.status_and_code().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status, code) = self.status_and_code();
        let message = match self {
            TransferError::Persistence(e) => {
                error!("persistence failure: {e}");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(status).json(serde_json::json!({
            "error": { "code": code, "message": message }
        }))
    }
}
