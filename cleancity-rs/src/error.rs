//! Error types for cleancity-rs
//!
//! Lookup and validation failures are typed so the HTTP layer can map each
//! one to a precise status. Nothing here is retried internally.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::classifier::ClassificationError;
use crate::models::ValidationState;

/// Main error type for the record service
#[derive(Debug, Error)]
pub enum Error {
    /// Bad input shape or range, fixable by the caller (400)
    #[error("Invalid observation: {0}")]
    InvalidObservation(String),

    /// Unknown record id (404)
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Record already left `pending`; the earlier decision stands (409)
    #[error("Record {id} already decided ({state})")]
    AlreadyDecided { id: Uuid, state: ValidationState },

    /// Decision action other than approve/reject (400)
    #[error("Invalid action: {0} (expected 'approve' or 'reject')")]
    InvalidAction(String),

    /// Other malformed request input, e.g. a blank decider (400)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Persistence layer failed; fatal to the current request (503)
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Classifier failure surfaced directly (ingestion downgrades these)
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    /// Admin token missing or wrong (401)
    #[error("Unauthorized")]
    Unauthorized,
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::StorageUnavailable(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::StorageUnavailable(err.to_string())
    }
}

impl From<cleancity_common::Error> for Error {
    fn from(err: cleancity_common::Error) -> Self {
        Error::StorageUnavailable(err.to_string())
    }
}

impl Error {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Error::InvalidObservation(_) => (StatusCode::BAD_REQUEST, "INVALID_OBSERVATION"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Error::AlreadyDecided { .. } => (StatusCode::CONFLICT, "ALREADY_DECIDED"),
            Error::InvalidAction(_) => (StatusCode::BAD_REQUEST, "INVALID_ACTION"),
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            Error::StorageUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE"),
            Error::Classification(ClassificationError::Unavailable) => {
                (StatusCode::SERVICE_UNAVAILABLE, "CLASSIFICATION_UNAVAILABLE")
            }
            Error::Classification(ClassificationError::Failed(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "CLASSIFICATION_FAILED")
            }
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Convenience Result type using the record service Error
pub type Result<T> = std::result::Result<T, Error>;
