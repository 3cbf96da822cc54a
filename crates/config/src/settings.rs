//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub rag: RagConfig,

    /// Generation endpoint configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Corpus ingestion configuration
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings shared by every binary.
    ///
    /// The signing key is deliberately not checked here -- ingestion runs
    /// without one. The API server requires it via [`Settings::require_signing_key`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token_lifetime_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "auth.token_lifetime_secs".to_string(),
                message: "Token lifetime must be non-zero".to_string(),
            });
        }

        if self.rag.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.top_k".to_string(),
                message: "top_k must be at least 1".to_string(),
            });
        }

        if self.rag.embedding.dimension == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.embedding.dimension".to_string(),
                message: "Embedding dimension must be non-zero".to_string(),
            });
        }

        Ok(())
    }

    /// Fail fast when the token signing key is missing.
    ///
    /// Without it every issued token would be forgeable; absence or rotation
    /// invalidates all outstanding tokens.
    pub fn require_signing_key(&self) -> Result<(), ConfigError> {
        if self.auth.signing_key.is_empty() {
            return Err(ConfigError::MissingField("auth.signing_key".to_string()));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: default_true(),
        }
    }
}

/// A registered doctor account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntry {
    pub username: String,
    /// Argon2 PHC-format hash of the password
    pub password_hash: String,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Token signing key. Required; rotation invalidates all outstanding
    /// tokens, which is the accepted fail-fast policy.
    /// Set via MEDISECURE__AUTH__SIGNING_KEY.
    #[serde(default)]
    pub signing_key: String,

    /// Token lifetime in seconds
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: u64,

    /// Registered accounts. When empty, the built-in demo doctors are
    /// hashed at startup.
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

fn default_token_lifetime() -> u64 {
    1800
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_key: String::new(),
            token_lifetime_secs: default_token_lifetime(),
            users: Vec::new(),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Directory holding the persisted store
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Collection name within the store directory
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Number of nearest cases retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Embedding configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

fn default_store_dir() -> String {
    "chroma_store".to_string()
}
fn default_collection() -> String {
    "medical_notes".to_string()
}
fn default_top_k() -> usize {
    3
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            collection: default_collection(),
            top_k: default_top_k(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding dimension
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Maximum sequence length (onnx builds)
    #[serde(default = "default_max_seq_len")]
    pub max_seq_len: usize,

    /// Normalize embeddings to unit length
    #[serde(default = "default_true")]
    pub normalize: bool,

    /// Batch size for bulk embedding
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// ONNX model path (onnx builds)
    #[serde(default = "default_model_path")]
    pub model_path: String,

    /// Tokenizer path (onnx builds)
    #[serde(default = "default_tokenizer_path")]
    pub tokenizer_path: String,

    /// ONNX output tensor name. Different models use different names:
    /// "last_hidden_state", "sentence_embedding", "output", etc.
    #[serde(default = "default_output_name")]
    pub output_name: String,
}

fn default_dimension() -> usize {
    384
}
fn default_max_seq_len() -> usize {
    512
}
fn default_batch_size() -> usize {
    32
}
fn default_model_path() -> String {
    "models/embeddings/all-MiniLM-L6-v2.onnx".to_string()
}
fn default_tokenizer_path() -> String {
    "models/embeddings/tokenizer.json".to_string()
}
fn default_output_name() -> String {
    "last_hidden_state".to_string()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            max_seq_len: default_max_seq_len(),
            normalize: default_true(),
            batch_size: default_batch_size(),
            model_path: default_model_path(),
            tokenizer_path: default_tokenizer_path(),
            output_name: default_output_name(),
        }
    }
}

/// Generation endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Full generation URL, including the /api/generate suffix
    #[serde(default = "default_generation_url")]
    pub url: String,

    /// Model identifier passed to the endpoint
    #[serde(default = "default_model_name")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

fn default_generation_url() -> String {
    "http://localhost:11434/api/generate".to_string()
}
fn default_model_name() -> String {
    "mistral".to_string()
}
fn default_generation_timeout() -> u64 {
    90
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            url: default_generation_url(),
            model: default_model_name(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

/// Corpus ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Path to the corpus CSV
    #[serde(default = "default_data_path")]
    pub data_path: String,

    /// Column holding the transcription text
    #[serde(default = "default_text_column")]
    pub text_column: String,
}

fn default_data_path() -> String {
    "data/medical_transcriptions.csv".to_string()
}
fn default_text_column() -> String {
    "transcription".to_string()
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            text_column: default_text_column(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. OLLAMA_URL / MODEL_NAME legacy variables
/// 2. Environment variables (MEDISECURE__ prefix, `__` separator)
/// 3. config/{env} file (if env specified)
/// 4. config/default file
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("MEDISECURE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let mut settings: Settings = config.try_deserialize()?;

    if let Ok(url) = std::env::var("OLLAMA_URL") {
        settings.generation.url = url;
    }
    if let Ok(model) = std::env::var("MODEL_NAME") {
        settings.generation.model = model;
    }

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.rag.top_k, 3);
        assert_eq!(settings.generation.url, "http://localhost:11434/api/generate");
        assert_eq!(settings.generation.model, "mistral");
        assert_eq!(settings.generation.timeout_secs, 90);
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.rag.top_k = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_signing_key_required_for_serving() {
        let mut settings = Settings::default();
        assert!(settings.require_signing_key().is_err());

        settings.auth.signing_key = "test-signing-key".to_string();
        assert!(settings.require_signing_key().is_ok());
    }
}
