//! Configuration value types for Taskboard

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for configuration types that can be validated and have defaults
pub trait ValidatedConfig:
    Send + Sync + Clone + Debug + Serialize + for<'de> Deserialize<'de>
{
    type Error: std::error::Error + Send + Sync + 'static;

    /// Validate the configuration, returning an error if invalid
    fn validate(&self) -> Result<(), Self::Error>;

    /// Get a description of what this configuration controls
    fn description() -> &'static str;
}

/// Helper trait for configurations that can be created with sensible defaults
pub trait DefaultConfig: ValidatedConfig + Default {
    /// Create a validated default configuration
    fn validated_default() -> Result<Self, Self::Error> {
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }
}

impl<T> DefaultConfig for T where T: ValidatedConfig + Default {}

/// Default REST endpoint of the document database service
pub const DEFAULT_REMOTE_ENDPOINT: &str = "https://cloud.appwrite.io/v1";

/// Default OpenAI-compatible endpoint used for board summaries
pub const DEFAULT_SUMMARY_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default model used for board summaries
pub const DEFAULT_SUMMARY_MODEL: &str = "gpt-4o-mini";

/// Default cap on summary length, in characters
pub const DEFAULT_MAX_CHARS: usize = 300;

/// Default system instructions sent with every summary request
pub const DEFAULT_SUMMARY_INSTRUCTIONS: &str = "You are a friendly project assistant. \
You receive a JSON object counting the tasks in each column of a kanban board \
(todo, inprogress, done). Greet the user, summarize how many tasks sit in each \
column and suggest what to focus on next. Reply in a single short paragraph.";

/// Top-level Taskboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TaskboardConfig {
    /// Connection to the remote document database and blob storage
    pub remote: RemoteConfig,
    /// Identifiers of the task collection and image bucket
    pub store: StoreConfig,
    /// Board summary generation
    pub summary: SummaryConfig,
}

/// Connection settings for the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL, including the API version prefix
    pub endpoint: String,
    /// Project the database and bucket belong to
    pub project_id: String,
    /// Server API key, sent as `X-Appwrite-Key`
    pub api_key: Option<String>,
    /// Session JWT, sent as `X-Appwrite-JWT`
    pub jwt: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_REMOTE_ENDPOINT.to_string(),
            project_id: String::new(),
            api_key: None,
            jwt: None,
            timeout_secs: 30,
        }
    }
}

/// Where tasks and their images live in the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_id: String,
    pub collection_id: String,
    pub bucket_id: String,
    /// Document field holding the owning user's id
    pub owner_field: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_id: "taskboard".to_string(),
            collection_id: "tasks".to_string(),
            bucket_id: "images".to_string(),
            owner_field: "userId".to_string(),
        }
    }
}

/// Settings for the chat-completion summary request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Replies longer than this are truncated on a character boundary
    pub max_chars: usize,
    pub instructions: String,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SUMMARY_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_SUMMARY_MODEL.to_string(),
            temperature: 0.8,
            max_tokens: 300,
            max_chars: DEFAULT_MAX_CHARS,
            instructions: DEFAULT_SUMMARY_INSTRUCTIONS.to_string(),
        }
    }
}

fn require_non_empty(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::invalid_value(key, "must not be empty"));
    }
    Ok(())
}

fn require_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::invalid_value(
            key,
            format!("'{}' is not an http(s) URL", value),
        ))
    }
}

impl ValidatedConfig for RemoteConfig {
    type Error = ConfigError;

    fn validate(&self) -> Result<(), Self::Error> {
        require_http_url("remote.endpoint", &self.endpoint)?;
        require_non_empty("remote.project_id", &self.project_id)?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "remote.timeout_secs",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    fn description() -> &'static str {
        "Remote document database connection"
    }
}

impl ValidatedConfig for StoreConfig {
    type Error = ConfigError;

    fn validate(&self) -> Result<(), Self::Error> {
        require_non_empty("store.database_id", &self.database_id)?;
        require_non_empty("store.collection_id", &self.collection_id)?;
        require_non_empty("store.bucket_id", &self.bucket_id)?;
        require_non_empty("store.owner_field", &self.owner_field)
    }

    fn description() -> &'static str {
        "Task collection and image bucket identifiers"
    }
}

impl ValidatedConfig for SummaryConfig {
    type Error = ConfigError;

    fn validate(&self) -> Result<(), Self::Error> {
        require_http_url("summary.endpoint", &self.endpoint)?;
        require_non_empty("summary.model", &self.model)?;
        if self.max_chars == 0 {
            return Err(ConfigError::invalid_value(
                "summary.max_chars",
                "must be greater than 0",
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::invalid_value(
                "summary.temperature",
                format!("{} is outside 0..=2", self.temperature),
            ));
        }
        Ok(())
    }

    fn description() -> &'static str {
        "Board summary generation"
    }
}

impl ValidatedConfig for TaskboardConfig {
    type Error = ConfigError;

    fn validate(&self) -> Result<(), Self::Error> {
        self.remote.validate()?;
        self.store.validate()?;
        self.summary.validate()
    }

    fn description() -> &'static str {
        "Taskboard client configuration"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> TaskboardConfig {
        let mut config = TaskboardConfig::default();
        config.remote.project_id = "board-project".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = TaskboardConfig::default();
        assert_eq!(config.store.owner_field, "userId");
        assert_eq!(config.summary.max_chars, DEFAULT_MAX_CHARS);
        assert_eq!(config.summary.model, DEFAULT_SUMMARY_MODEL);
        assert!(config.remote.api_key.is_none());
    }

    #[test]
    fn test_default_config_needs_a_project() {
        let err = TaskboardConfig::validated_default().unwrap_err();
        assert!(err.to_string().contains("remote.project_id"));
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_empty_identifiers_rejected() {
        let mut config = valid_config();
        config.store.bucket_id = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "store.bucket_id"));
    }

    #[test]
    fn test_non_http_endpoint_rejected() {
        let mut config = valid_config();
        config.remote.endpoint = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_max_chars_rejected() {
        let mut config = valid_config();
        config.summary.max_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_temperature_range() {
        let mut config = valid_config();
        config.summary.temperature = 2.0;
        assert!(config.validate().is_ok());
        config.summary.temperature = 2.5;
        assert!(config.validate().is_err());
        config.summary.temperature = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_fills_defaults() {
        let config: TaskboardConfig =
            serde_json::from_str(r#"{"store": {"bucket_id": "pictures"}}"#).unwrap();
        assert_eq!(config.store.bucket_id, "pictures");
        assert_eq!(config.store.collection_id, "tasks");
        assert_eq!(config.remote.timeout_secs, 30);
    }
}
