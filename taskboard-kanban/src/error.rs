//! Error types for the kanban engine

use taskboard_common::{ErrorSeverity, Severity};
use thiserror::Error;

/// Result type for kanban operations
pub type Result<T> = std::result::Result<T, KanbanError>;

/// Errors that can occur in kanban operations
#[derive(Debug, Error)]
pub enum KanbanError {
    /// A position that no longer matches the board, usually a drag computed
    /// against an older snapshot
    #[error("stale reference: index {index} is out of range for '{column}' ({len} entries)")]
    StaleReference {
        column: String,
        index: usize,
        len: usize,
    },

    /// Task not found
    #[error("task not found: {id}")]
    TaskNotFound { id: String },

    /// A call to the remote store failed
    #[error("remote {operation} failed: {message}")]
    RemoteSync { operation: String, message: String },

    /// Generic remote resource not found (documents, blobs)
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// Image metadata that does not decode into a bucket id and file id
    #[error("malformed image reference: {message}")]
    MalformedImageReference { message: String },

    /// No authenticated user
    #[error("not authenticated: {message}")]
    Unauthenticated { message: String },

    /// Invalid field value
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KanbanError {
    /// Create a stale reference error
    pub fn stale(column: impl Into<String>, index: usize, len: usize) -> Self {
        Self::StaleReference {
            column: column.into(),
            index,
            len,
        }
    }

    /// Create a remote sync error
    pub fn remote_sync(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteSync {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a malformed image reference error
    pub fn malformed_image(message: impl Into<String>) -> Self {
        Self::MalformedImageReference {
            message: message.into(),
        }
    }

    /// Create an unauthenticated error
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleReference { .. })
    }
}

impl Severity for KanbanError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Unauthenticated { .. } => ErrorSeverity::Critical,
            Self::MalformedImageReference { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}
