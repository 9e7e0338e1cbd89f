use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Malformed input: inverted date range, partial bed/room pair, missing field
    #[error("{message}")]
    InvalidArgument { message: String },

    /// Referenced admission, bed, room, patient, physician or vacation does not exist
    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: String },

    /// Business rule violation
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Error kinds reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Conflict,
    Fatal,
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
    /// Whether repeating the whole operation may succeed
    pub retryable: bool,
}

impl Error {
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument { message: message.into() }
    }

    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        Error::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Error::Conflict { message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => ErrorKind::NotFound,
                DbError::UniqueViolation { .. } => ErrorKind::Conflict,
                DbError::ForeignKeyViolation { .. } => ErrorKind::NotFound,
                DbError::CheckViolation { .. } => ErrorKind::InvalidArgument,
                DbError::SerializationFailure { .. } => ErrorKind::Conflict,
                DbError::Other(_) => ErrorKind::Fatal,
            },
            Error::Other(_) => ErrorKind::Fatal,
        }
    }

    /// True for conflicts detected by the database's serialization checks.
    /// The caller must repeat the whole operation, not only its last statement.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Database(DbError::SerializationFailure { .. }))
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidArgument { message } | Error::Conflict { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} {id} not found"),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, .. } => match constraint.as_deref() {
                    Some("admissions_one_ongoing_per_patient") => "Patient already has an ongoing admission".to_string(),
                    Some("beds_pkey") => "Bed already exists".to_string(),
                    Some("vacations_pkey") => "A vacation starting on that date already exists".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::SerializationFailure { .. } => "Concurrent modification detected, retry the operation".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

/// Convert raw sqlx errors through the database classification
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database(err.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match self.kind() {
            ErrorKind::Fatal => tracing::error!("Internal service error: {:#}", self),
            ErrorKind::Conflict => tracing::warn!("Conflict error: {}", self),
            ErrorKind::InvalidArgument | ErrorKind::NotFound => tracing::debug!("Client error: {}", self),
        }

        let body = ErrorBody {
            kind: self.kind(),
            message: self.user_message(),
            retryable: self.is_retryable(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
