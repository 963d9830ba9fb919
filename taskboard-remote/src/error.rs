//! Error types for the HTTP clients

use taskboard_common::{ErrorSeverity, Severity};
use taskboard_kanban::KanbanError;
use thiserror::Error;

/// Errors returned by the remote service clients
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport failure: connection, timeout, TLS
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 401
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// 403
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// 404
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// Any other non-2xx status
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// A 2xx response whose body does not have the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request could not be built
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RemoteError {
    /// Convert into the board engine's error type, naming the failed
    /// operation for errors that become `RemoteSync`.
    pub fn into_kanban(self, operation: &str) -> KanbanError {
        match self {
            Self::NotFound { resource, id } => KanbanError::not_found(resource, id),
            Self::Unauthorized(message) | Self::Forbidden(message) => {
                KanbanError::unauthenticated(message)
            }
            other => KanbanError::remote_sync(operation, other.to_string()),
        }
    }
}

impl From<RemoteError> for KanbanError {
    fn from(error: RemoteError) -> Self {
        error.into_kanban("request")
    }
}

impl Severity for RemoteError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Unauthorized(_) | Self::Forbidden(_) => ErrorSeverity::Critical,
            Self::NotFound { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_not_found() {
        let err = RemoteError::NotFound {
            resource: "file".to_string(),
            id: "f1".to_string(),
        }
        .into_kanban("delete blob");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_auth_failures_map_to_unauthenticated() {
        for err in [
            RemoteError::Unauthorized("expired".to_string()),
            RemoteError::Forbidden("missing scope".to_string()),
        ] {
            assert!(matches!(
                KanbanError::from(err),
                KanbanError::Unauthenticated { .. }
            ));
        }
    }

    #[test]
    fn test_other_failures_map_to_remote_sync() {
        let err = RemoteError::Api {
            status: 500,
            body: "boom".to_string(),
        }
        .into_kanban("update");
        match err {
            KanbanError::RemoteSync { operation, message } => {
                assert_eq!(operation, "update");
                assert!(message.contains("500"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
