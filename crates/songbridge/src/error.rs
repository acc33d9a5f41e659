//! Error types for the songbridge library.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for songbridge operations.
#[derive(Debug, Error)]
pub enum SongbridgeError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A raw item that cannot be processed at all.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A metadata or catalog source timed out or errored.
    #[error("{stage} unavailable: {message}")]
    LookupUnavailable { stage: String, message: String },

    /// An AI provider refused the call because its quota is spent.
    #[error("Quota exceeded for provider '{provider}'")]
    QuotaExceeded { provider: String },

    /// An AI provider failed or answered with something unusable.
    #[error("Provider '{provider}' failed: {message}")]
    ServiceError { provider: String, message: String },

    /// The destination playlist refused an add or remove.
    #[error("Destination rejected '{native_id}': {message}")]
    MutationRejected { native_id: String, message: String },

    /// Feedback store write/read failure.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The caller cancelled the run.
    #[error("Cancelled")]
    Cancelled,
}

impl SongbridgeError {
    /// Build a lookup failure for a named stage.
    pub fn lookup(stage: impl Into<String>, message: impl Into<String>) -> Self {
        SongbridgeError::LookupUnavailable {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Build a provider failure.
    pub fn service(provider: impl Into<String>, message: impl Into<String>) -> Self {
        SongbridgeError::ServiceError {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Build a destination mutation failure.
    pub fn rejected(native_id: impl Into<String>, message: impl Into<String>) -> Self {
        SongbridgeError::MutationRejected {
            native_id: native_id.into(),
            message: message.into(),
        }
    }

    /// Classify this error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SongbridgeError::LookupUnavailable { .. } | SongbridgeError::ServiceError { .. } => {
                ErrorKind::LookupUnavailable
            }
            SongbridgeError::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            SongbridgeError::MutationRejected { .. } => ErrorKind::MutationRejected,
            SongbridgeError::InvalidInput(_) => ErrorKind::InvalidInput,
            SongbridgeError::Cancelled => ErrorKind::Cancelled,
            SongbridgeError::Io { .. }
            | SongbridgeError::Json(_)
            | SongbridgeError::Csv(_)
            | SongbridgeError::Config(_)
            | SongbridgeError::Regex(_)
            | SongbridgeError::Persistence(_) => ErrorKind::Internal,
        }
    }
}

/// Serializable error classification carried in sync reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A lookup stage was unreachable or errored.
    LookupUnavailable,
    /// AI quota spent on every provider.
    QuotaExceeded,
    /// The destination catalog had nothing for the song.
    NoCandidateFound,
    /// The destination refused a mutation.
    MutationRejected,
    /// The raw item was malformed.
    InvalidInput,
    /// The run was cancelled before this item was processed.
    Cancelled,
    /// Anything else (I/O, serialization, configuration).
    Internal,
}

impl ErrorKind {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::LookupUnavailable => "Lookup unavailable",
            ErrorKind::QuotaExceeded => "Quota exceeded",
            ErrorKind::NoCandidateFound => "No candidate found",
            ErrorKind::MutationRejected => "Mutation rejected",
            ErrorKind::InvalidInput => "Invalid input",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::Internal => "Internal error",
        }
    }
}

/// Result type alias for songbridge operations.
pub type Result<T> = std::result::Result<T, SongbridgeError>;
