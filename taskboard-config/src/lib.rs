//! # Taskboard Config
//!
//! Layered configuration for the Taskboard client, built on `figment`:
//! built-in defaults, then `taskboard.{toml,yaml,yml,json}` from
//! `~/.taskboard/` and `./.taskboard/`, then `TASKBOARD_*` environment
//! variables (`__` separates nested keys, e.g. `TASKBOARD_STORE__BUCKET_ID`).
//!
//! ```no_run
//! use taskboard_config::ConfigProvider;
//!
//! let config = ConfigProvider::new().load()?;
//! println!("tasks live in {}", config.store.collection_id);
//! # Ok::<(), taskboard_config::ConfigError>(())
//! ```

pub mod discovery;
pub mod error;
pub mod provider;
pub mod types;

pub use discovery::{ConfigFile, ConfigFormat, ConfigScope, FileDiscovery};
pub use error::ConfigError;
pub use provider::{ConfigProvider, ENV_PREFIX};
pub use types::{
    DefaultConfig, RemoteConfig, StoreConfig, SummaryConfig, TaskboardConfig, ValidatedConfig,
};

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
