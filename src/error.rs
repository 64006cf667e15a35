//! Error types for the tracker

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for tracker internals
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned {status}: {body}")]
    Store { status: u16, body: String },

    #[error("Response decoding error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Error categories surfaced to the UI collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A store request failed or returned a non-success status
    NetworkError,
    /// The transaction itself reported failed; message and details come
    /// from the store
    Unknown,
}

/// Observable error state exposed alongside the tracked transaction.
///
/// The kind is serialized under the `type` key, matching what the UI
/// collaborator renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionError {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl TransactionError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ErrorKind::NetworkError,
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_under_type_key() {
        let err = TransactionError::network("Failed to create transaction");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "network_error");
        assert_eq!(json["message"], "Failed to create transaction");
        assert!(json.get("details").is_none());
    }
}
