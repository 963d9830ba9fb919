//! # Taskboard Common
//!
//! Foundational pieces shared by every Taskboard crate:
//!
//! - [`error`] - `ErrorSeverity` and the `Severity` trait used to classify
//!   every crate-level error type
//! - [`logging`] - the `Pretty` wrapper for YAML-formatted tracing output

pub mod error;
pub mod logging;

pub use error::{ErrorSeverity, Severity};
pub use logging::Pretty;
