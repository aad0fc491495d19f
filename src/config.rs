use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid consumer offset timestamp '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

const REDACTED: &str = "***";

/// A credential that never shows up in `Debug` output
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Filter query applied when none is given on the command line
    pub query: String,
    pub consumer: ConsumerOptions,
    pub schema_registry: SchemaRegistryOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerOptions {
    pub bootstrap_servers: Option<String>,
    pub group_id: Option<String>,
    pub sasl_username: Option<String>,
    pub sasl_password: Option<Secret>,
    pub topic: Option<String>,
    /// RFC 3339 instant to start consuming from
    pub consumer_group_offset_utc_timestamp: Option<String>,
}

impl ConsumerOptions {
    pub fn offset_timestamp(&self) -> Result<Option<DateTime<Utc>>, ConfigError> {
        let Some(value) = self.consumer_group_offset_utc_timestamp.as_deref() else {
            return Ok(None);
        };

        DateTime::parse_from_rfc3339(value.trim())
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|source| ConfigError::InvalidTimestamp {
                value: value.to_string(),
                source,
            })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaRegistryOptions {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<Secret>,
}

impl AppConfig {
    /// Copy of this config with every credential replaced by a placeholder
    pub fn redacted(&self) -> Self {
        let mask = |secret: &Option<Secret>| secret.as_ref().map(|_| Secret::new(REDACTED));

        let mut cfg = self.clone();
        cfg.consumer.sasl_password = mask(&self.consumer.sasl_password);
        cfg.schema_registry.password = mask(&self.schema_registry.password);
        cfg
    }

    /// Topic label for messages that carry none
    pub fn topic_or_default(&self) -> &str {
        self.consumer
            .topic
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or("-")
    }
}

pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    let cfg = toml::from_str::<AppConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })?;
    cfg.consumer.offset_timestamp()?;
    Ok(cfg)
}

pub fn default_config() -> &'static AppConfig {
    static DEFAULT_CONFIG: LazyLock<AppConfig> = LazyLock::new(AppConfig::default);
    &DEFAULT_CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "***");
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn test_redacted_keeps_absent_secrets_absent() {
        let mut cfg = AppConfig::default();
        cfg.consumer.sasl_password = Some(Secret::new("pw"));

        let redacted = cfg.redacted();
        assert_eq!(redacted.consumer.sasl_password, Some(Secret::new("***")));
        assert_eq!(redacted.schema_registry.password, None);
    }

    #[test]
    fn test_offset_timestamp() {
        let mut consumer = ConsumerOptions::default();
        assert!(consumer.offset_timestamp().unwrap().is_none());

        consumer.consumer_group_offset_utc_timestamp = Some("2026-03-01T12:00:00+02:00".to_string());
        let ts = consumer.offset_timestamp().unwrap().unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-03-01T10:00:00+00:00");

        consumer.consumer_group_offset_utc_timestamp = Some("yesterday".to_string());
        assert!(matches!(
            consumer.offset_timestamp(),
            Err(ConfigError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_topic_or_default() {
        let mut cfg = AppConfig::default();
        assert_eq!(cfg.topic_or_default(), "-");
        cfg.consumer.topic = Some("orders".to_string());
        assert_eq!(cfg.topic_or_default(), "orders");
    }
}
