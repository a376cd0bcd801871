//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, BackendConfig, BatchConfig, LlmConfig, LogFormat, LoggingConfig, MetricsConfig,
    ServerConfig, StorageSettings, TuningConfig,
};
