//! Severity classification shared by all Taskboard error types
//!
//! Each crate owns its own `thiserror` enum; this module only provides the
//! vocabulary those enums use to tell callers how bad a failure is.

/// Severity levels for error classification
///
/// - **Warning**: the operation completed but something was skipped, such as
///   an image blob that could not be cleaned up.
/// - **Error**: the operation failed, the session carries on.
/// - **Critical**: the session cannot continue, for example because the user
///   is no longer authenticated.
///
/// # Examples
///
/// ```rust
/// use taskboard_common::ErrorSeverity;
///
/// let skipped_cleanup = ErrorSeverity::Warning;
/// let failed_write = ErrorSeverity::Error;
/// assert_ne!(skipped_cleanup, failed_write);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Potential issue but operation can proceed
    Warning,

    /// Operation failed but the session can continue
    Error,

    /// Session cannot continue, requires attention
    Critical,
}

impl ErrorSeverity {
    /// Lowercase label, used in log fields and CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for error types that have severity levels
///
/// # Example
///
/// ```rust
/// use taskboard_common::{ErrorSeverity, Severity};
///
/// #[derive(Debug)]
/// enum SyncError {
///     SessionExpired,
///     WriteRejected,
///     CleanupSkipped,
/// }
///
/// impl Severity for SyncError {
///     fn severity(&self) -> ErrorSeverity {
///         match self {
///             SyncError::SessionExpired => ErrorSeverity::Critical,
///             SyncError::WriteRejected => ErrorSeverity::Error,
///             SyncError::CleanupSkipped => ErrorSeverity::Warning,
///         }
///     }
/// }
///
/// assert_eq!(SyncError::SessionExpired.severity(), ErrorSeverity::Critical);
/// ```
pub trait Severity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;

    /// True when the failure must not end the current session
    fn is_recoverable(&self) -> bool {
        self.severity() != ErrorSeverity::Critical
    }
}
