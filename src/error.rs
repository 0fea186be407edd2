use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// Fixed message keys carried by every business error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMessage {
    RequiredTopicField,
    RequiredNameField,
    RequiredCpfField,
    RequiredVoteField,
    RequiredUserField,
    RequiredPollField,
    TopicNotFound,
    PollNotFound,
    UserNotFound,
    PollWithTopicAlreadyRunning,
    PollInPast,
    DuplicateCpf,
}

impl ErrorMessage {
    pub fn message(self) -> &'static str {
        match self {
            Self::RequiredTopicField => "topic required",
            Self::RequiredNameField => "name required",
            Self::RequiredCpfField => "cpf required",
            Self::RequiredVoteField => "vote required",
            Self::RequiredUserField => "user required",
            Self::RequiredPollField => "poll required",
            Self::TopicNotFound => "topic not found",
            Self::PollNotFound => "poll not found",
            Self::UserNotFound => "user not found",
            Self::PollWithTopicAlreadyRunning => "poll already running for this topic",
            Self::PollInPast => "poll end in the past",
            Self::DuplicateCpf => "cpf already registered",
        }
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Failures raised by a storage backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Referenced row missing: {0}")]
    ForeignKeyViolation(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return StoreError::UniqueViolation(db.message().to_string());
            }
            if db.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation(db.message().to_string());
            }
        }

        StoreError::Database(e)
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    MissingParameter(ErrorMessage),

    #[error("{0}")]
    ResourceNotFound(ErrorMessage),

    #[error("{0}")]
    InvalidParameter(ErrorMessage),

    #[error("{0}")]
    DuplicateRecord(ErrorMessage),

    /// Body or path that could not be decoded into the expected shape.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Internal error: {0}")]
    Store(#[from] StoreError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl AppError {
    /// Message key of a business error, `None` for rejected input and store failures.
    pub fn key(&self) -> Option<ErrorMessage> {
        match self {
            AppError::MissingParameter(key)
            | AppError::ResourceNotFound(key)
            | AppError::InvalidParameter(key)
            | AppError::DuplicateRecord(key) => Some(*key),
            AppError::Rejected { .. } | AppError::Store(_) => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingParameter(_) | AppError::InvalidParameter(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateRecord(_) => StatusCode::CONFLICT,
            AppError::Rejected { status, .. } => *status,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::Store(e) => error!(error = %e, "Request failed on store access"),
            _ => debug!(key = ?self.key(), %status, "Request rejected: {self}"),
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Start-up failures of the server binary.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
