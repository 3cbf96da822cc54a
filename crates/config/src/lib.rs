//! Configuration management for the MediSecure RAG service
//!
//! Supports loading configuration from:
//! - TOML/YAML files (`config/default`, then `config/{env}`)
//! - Environment variables (MEDISECURE__ prefix, `__` separator)
//!
//! The legacy `OLLAMA_URL` and `MODEL_NAME` variables are honored as direct
//! overrides of the generation endpoint and model.

pub mod settings;

pub use settings::{
    load_settings, AuthConfig, EmbeddingConfig, GenerationConfig, IngestConfig,
    ObservabilityConfig, RagConfig, ServerConfig, Settings, UserEntry,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
