//! Taskboard CLI library: argument definitions, board rendering and command
//! execution, shared by the `taskboard` binary and its tests.

pub mod cli;
pub mod commands;
pub mod table;

pub use cli::{Cli, Commands};
pub use commands::Session;

use taskboard_common::{ErrorSeverity, Pretty, Severity};
use taskboard_config::{ConfigError, TaskboardConfig};
use taskboard_kanban::KanbanError;

const REDACTED: &str = "********";

/// The configuration as YAML, with credentials masked
pub fn describe_config(config: &TaskboardConfig) -> String {
    let mut shown = config.clone();
    for secret in [
        &mut shown.remote.api_key,
        &mut shown.remote.jwt,
        &mut shown.summary.api_key,
    ] {
        if secret.is_some() {
            *secret = Some(REDACTED.to_string());
        }
    }
    Pretty(&shown).to_string().trim_start().to_string()
}

/// Worst severity found in an error chain; unclassified errors count as
/// `Error`
pub fn severity_of(error: &anyhow::Error) -> ErrorSeverity {
    error
        .chain()
        .filter_map(|cause| {
            cause
                .downcast_ref::<KanbanError>()
                .map(Severity::severity)
                .or_else(|| cause.downcast_ref::<ConfigError>().map(Severity::severity))
        })
        .max()
        .unwrap_or(ErrorSeverity::Error)
}
