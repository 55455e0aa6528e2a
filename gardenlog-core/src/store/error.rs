//! Store error types.

use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;
use crate::models::RecordKind;

/// The store call that was being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    List,
    Get,
    Filter,
    Create,
    Update,
    Delete,
}

/// A verb applied to one collection, e.g. "update activity".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub verb: Verb,
    pub kind: RecordKind,
}

impl Operation {
    pub fn new(verb: Verb, kind: RecordKind) -> Self {
        Self { verb, kind }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.verb {
            Verb::List => write!(f, "list {}", self.kind.plural()),
            Verb::Get => write!(f, "fetch {}", self.kind),
            Verb::Filter => write!(f, "filter {}", self.kind.plural()),
            Verb::Create => write!(f, "create {}", self.kind),
            Verb::Update => write!(f, "update {}", self.kind),
            Verb::Delete => write!(f, "delete {}", self.kind),
        }
    }
}

/// Network-level failure talking to the remote store.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("Server returned status {status}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Errors that can occur during remote store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Network error or non-2xx response
    #[error("Failed to {operation}: {source}")]
    Transport {
        operation: Operation,
        source: TransportError,
    },

    /// The record to update or delete does not exist remotely
    #[error("Failed to {operation}: no {} with ID {id}", .operation.kind)]
    NotFound { operation: Operation, id: String },

    /// The response (or a sheet cell) could not be decoded
    #[error("Failed to {operation}: invalid response: {message}")]
    Decode { operation: Operation, message: String },

    /// Neither store variant has its settings
    #[error("Remote store not configured. Set GOOGLE_API_KEY and SPREADSHEET_ID, or BEDS_API_URL and ACTIVITIES_API_URL.")]
    NotConfigured,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl StoreError {
    pub fn transport(operation: Operation, source: impl Into<TransportError>) -> Self {
        StoreError::Transport {
            operation,
            source: source.into(),
        }
    }

    pub fn not_found(operation: Operation, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            operation,
            id: id.into(),
        }
    }

    pub fn decode(operation: Operation, message: impl fmt::Display) -> Self {
        StoreError::Decode {
            operation,
            message: message.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, StoreError::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display() {
        assert_eq!(
            Operation::new(Verb::List, RecordKind::Activity).to_string(),
            "list activities"
        );
        assert_eq!(
            Operation::new(Verb::Update, RecordKind::Bed).to_string(),
            "update bed"
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = StoreError::not_found(Operation::new(Verb::Delete, RecordKind::Bed), "17");
        assert_eq!(err.to_string(), "Failed to delete bed: no bed with ID 17");
        assert!(err.is_not_found());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_status_message() {
        let err = StoreError::transport(
            Operation::new(Verb::Create, RecordKind::Activity),
            TransportError::Status {
                status: reqwest::StatusCode::FORBIDDEN,
                body: String::new(),
            },
        );
        assert_eq!(
            err.to_string(),
            "Failed to create activity: Server returned status 403 Forbidden"
        );
        assert!(err.is_transport());
    }
}
