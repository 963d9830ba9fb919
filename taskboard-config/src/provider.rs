//! Configuration provider using Figment

use crate::{
    discovery::{ConfigFile, ConfigFormat, FileDiscovery},
    types::{TaskboardConfig, ValidatedConfig},
    ConfigResult,
};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// Prefix of environment variables read into the configuration
pub const ENV_PREFIX: &str = "TASKBOARD_";

/// Loads [`TaskboardConfig`] from all configuration sources.
///
/// Sources in precedence order (later sources override earlier ones):
/// 1. Built-in defaults
/// 2. Discovered configuration files, global before project
/// 3. An explicit file, when one was given
/// 4. `TASKBOARD_` environment variables, `__` separating nested keys
///
/// Nothing is cached; each call reads the sources again.
#[derive(Debug, Default)]
pub struct ConfigProvider {
    discovery: FileDiscovery,
    explicit_file: Option<PathBuf>,
}

impl ConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom discovery, mainly to point tests at temporary directories
    pub fn with_discovery(mut self, discovery: FileDiscovery) -> Self {
        self.discovery = discovery;
        self
    }

    /// Layer one more file above the discovered ones
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    /// Load and validate the configuration
    pub fn load(&self) -> ConfigResult<TaskboardConfig> {
        let config = self.load_unvalidated()?;
        config.validate()?;
        info!(
            "Loaded configuration for project '{}' (collection '{}')",
            config.remote.project_id, config.store.collection_id
        );
        Ok(config)
    }

    /// Load the configuration without validating it
    pub fn load_unvalidated(&self) -> ConfigResult<TaskboardConfig> {
        let config = self.build_figment()?.extract::<TaskboardConfig>()?;
        Ok(config)
    }

    fn build_figment(&self) -> ConfigResult<Figment> {
        debug!("Building figment configuration with precedence order");

        let mut figment = Figment::from(Serialized::defaults(TaskboardConfig::default()));

        for config_file in self.discovery.discover_all() {
            trace!(
                "Loading config file: {} ({:?})",
                config_file.path.display(),
                config_file.format
            );
            figment = figment.merge(Self::file_provider(&config_file));
        }

        if let Some(path) = &self.explicit_file {
            let format = path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(ConfigFormat::from_extension)
                .unwrap_or(ConfigFormat::Toml);
            trace!("Loading explicit config file: {}", path.display());
            figment = figment.merge(Self::format_provider(path, format));
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    fn file_provider(config_file: &ConfigFile) -> Figment {
        Self::format_provider(&config_file.path, config_file.format)
    }

    fn format_provider(path: &Path, format: ConfigFormat) -> Figment {
        match format {
            ConfigFormat::Toml => Figment::from(Toml::file(path)),
            ConfigFormat::Yaml => Figment::from(Yaml::file(path)),
            ConfigFormat::Json => Figment::from(Json::file(path)),
        }
    }
}
