use std::time::Duration;

use serde::Deserialize;

use crate::domain::batch::DEFAULT_CHUNK_SIZE;
use crate::domain::DomainError;
use crate::infrastructure::storage::{PostgresConfig, StorageConfig, StorageType};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub tuning: TuningConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted batch upload, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Model-serving backend
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

/// OpenAI-compatible completion API used for explanations and samples
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(rename = "type")]
    pub storage_type: String,
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    pub chunk_size: usize,
    /// How long finished jobs stay available for polling and export
    #[serde(default = "default_batch_retention_secs")]
    pub retention_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TuningConfig {
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
}

fn default_batch_retention_secs() -> u64 {
    3600
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_backend_timeout() -> u64 {
    60
}

fn default_llm_timeout() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_secs: default_backend_timeout(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            storage_type: "memory".to_string(),
            postgres_url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl StorageSettings {
    pub fn to_storage_config(&self) -> Result<StorageConfig, DomainError> {
        let storage_type = StorageType::parse(&self.storage_type).ok_or_else(|| {
            DomainError::configuration(format!("Unknown storage type '{}'", self.storage_type))
        })?;

        match storage_type {
            StorageType::InMemory => Ok(StorageConfig::InMemory),
            StorageType::Postgres => {
                let url = self.postgres_url.as_deref().ok_or_else(|| {
                    DomainError::configuration("storage.postgres_url is required for postgres storage")
                })?;

                Ok(StorageConfig::Postgres(
                    PostgresConfig::new(url).with_max_connections(self.max_connections),
                ))
            }
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            retention_secs: default_batch_retention_secs(),
        }
    }
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
        }
    }
}

impl BatchConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

impl TuningConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.batch.chunk_size, 10);
        assert_eq!(config.batch.retention(), Duration::from_secs(3600));
        assert_eq!(config.tuning.poll_interval(), Duration::from_secs(5));
        assert!(config.llm.api_key.is_none());
        assert!(matches!(
            config.storage.to_storage_config().unwrap(),
            StorageConfig::InMemory
        ));
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [backend]
                base_url = "http://models:5000"

                [storage]
                type = "postgres"
                postgres_url = "postgres://db/exo"

                [logging]
                level = "debug"
                format = "json"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.backend.base_url, "http://models:5000");
        assert_eq!(config.backend.timeout_secs, 60);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.batch.chunk_size, 10);
        assert!(matches!(
            config.storage.to_storage_config().unwrap(),
            StorageConfig::Postgres(ref pg) if pg.url == "postgres://db/exo"
        ));
    }

    #[test]
    fn test_postgres_without_url_is_rejected() {
        let settings = StorageSettings {
            storage_type: "postgres".to_string(),
            postgres_url: None,
            max_connections: 5,
        };
        assert!(settings.to_storage_config().is_err());

        let settings = StorageSettings {
            storage_type: "mongo".to_string(),
            ..StorageSettings::default()
        };
        assert!(settings.to_storage_config().is_err());
    }
}
