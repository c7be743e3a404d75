
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::embeddings::chunking::ChunkingConfig;

/// Overrides the platform config directory when set
pub const CONFIG_DIR_ENV: &str = "DOCS_QA_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_DIR_NAME: &str = "docs-qa";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Settings for the chat-completions backend used for all generation tasks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of an OpenAI-compatible API, e.g. `https://api.groq.com/openai/v1/`
    pub api_base: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub connect_timeout_secs: u64,
    /// Generous on purpose: latency grows with the requested output length
    pub read_timeout_secs: u64,
    /// Resolved from `api_key_env` at load time, never written to disk
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.groq.com/openai/v1/".to_string(),
            model: "llama3-8b-8192".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            connect_timeout_secs: 30,
            read_timeout_secs: 120,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EmbeddingProviderKind {
    /// all-MiniLM-L6-v2 run in-process through fastembed
    #[default]
    Local,
    /// Ollama-compatible embedding server
    Remote,
    /// No embeddings; retrieval falls back to document order
    None,
}

impl std::fmt::Display for EmbeddingProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Local => "local",
            Self::Remote => "remote",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    /// Vector dimension of the remote model; the local model always yields 384
    pub dimension: u32,
    pub ollama: OllamaConfig,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Local,
            dimension: 384,
            ollama: OllamaConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub model: String,
    pub batch_size: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            model: "all-minilm:latest".to_string(),
            batch_size: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of segments retrieved for question answering and evaluation
    pub top_k: usize,
    /// Leading segments used as summary context
    pub summary_segments: usize,
    /// Segments sampled as challenge-question context
    pub challenge_segments: usize,
    /// Upper bound on characters of document text placed in a summary prompt
    pub max_context_chars: usize,
    pub max_upload_bytes: usize,
    /// Append a `[Reference: ...]` line naming the best-matching segment to answers
    pub append_reference: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            summary_segments: 3,
            challenge_segments: 5,
            max_context_chars: 8000,
            max_upload_bytes: 2 * 1024 * 1024,
            append_reference: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid API key variable name: {0} (cannot be empty)")]
    InvalidApiKeyEnv(String),
    #[error("Invalid connect timeout: {0} (must be between 1 and 300 seconds)")]
    InvalidConnectTimeout(u64),
    #[error("Invalid read timeout: {0} (must be between 10 and 900 seconds)")]
    InvalidReadTimeout(u64),
    #[error("Invalid embedding dimension: {0} (must be between 64 and 4096)")]
    InvalidEmbeddingDimension(u32),
    #[error("Invalid chunk size: {0} (must be between 16 and 8192)")]
    InvalidChunkSize(usize),
    #[error("Chunk overlap ({0}) must be smaller than chunk size ({1})")]
    OverlapTooLarge(usize, usize),
    #[error("Invalid top_k: {0} (must be between 1 and 50)")]
    InvalidTopK(usize),
    #[error("Invalid segment count for {0}: {1} (must be between 1 and 50)")]
    InvalidSegmentCount(&'static str, usize),
    #[error("Invalid max context characters: {0} (must be between 500 and 100000)")]
    InvalidMaxContextChars(usize),
    #[error("Invalid max upload size: {0} bytes (must be between 1 KiB and 10 MiB)")]
    InvalidMaxUploadBytes(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Load `config.toml` from `config_dir`, falling back to defaults when absent.
    /// The generation API key is resolved from the environment afterwards.
    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILE_NAME);

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;

            let config: Config = toml::from_str(&content).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })?;
            config
        } else {
            Self::default()
        };
        config.base_dir = config_dir.as_ref().to_path_buf();
        config.generation.resolve_api_key();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    /// Load from the default configuration directory
    #[inline]
    pub fn load_default() -> Result<Self> {
        let dir = Self::config_dir().context("Failed to locate configuration directory")?;
        Self::load(dir)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Directory holding `config.toml`: `$DOCS_QA_CONFIG_DIR`, else the platform config dir
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join(CONFIG_FILE_NAME)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generation.validate()?;
        self.embeddings.validate()?;
        self.validate_chunking_config()?;
        self.retrieval.validate()?;
        Ok(())
    }

    fn validate_chunking_config(&self) -> Result<(), ConfigError> {
        let config = &self.chunking;

        if !(16..=8192).contains(&config.chunk_size) {
            return Err(ConfigError::InvalidChunkSize(config.chunk_size));
        }

        if config.chunk_overlap >= config.chunk_size {
            return Err(ConfigError::OverlapTooLarge(
                config.chunk_overlap,
                config.chunk_size,
            ));
        }

        Ok(())
    }
}

impl GenerationConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint()?;

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }

        if self.api_key_env.trim().is_empty() {
            return Err(ConfigError::InvalidApiKeyEnv(self.api_key_env.clone()));
        }

        if !(1..=300).contains(&self.connect_timeout_secs) {
            return Err(ConfigError::InvalidConnectTimeout(
                self.connect_timeout_secs,
            ));
        }

        if !(10..=900).contains(&self.read_timeout_secs) {
            return Err(ConfigError::InvalidReadTimeout(self.read_timeout_secs));
        }

        Ok(())
    }

    /// The chat completions endpoint derived from `api_base`
    #[inline]
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let mut base = self.api_base.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        let url = Url::parse(&base).map_err(|_| ConfigError::InvalidUrl(self.api_base.clone()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidProtocol(url.scheme().to_string()));
        }

        url.join("chat/completions")
            .map_err(|_| ConfigError::InvalidUrl(self.api_base.clone()))
    }

    /// Read the API key from the configured environment variable
    #[inline]
    pub fn resolve_api_key(&mut self) {
        self.api_key = std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
    }

    #[inline]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn set_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.model = model;
        Ok(())
    }

    pub fn set_api_base(&mut self, api_base: String) -> Result<(), ConfigError> {
        let temp_config = GenerationConfig {
            api_base: api_base.clone(),
            ..self.clone()
        };
        temp_config.endpoint()?;
        self.api_base = api_base;
        Ok(())
    }
}

impl EmbeddingConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(64..=4096).contains(&self.dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(self.dimension));
        }

        if self.provider == EmbeddingProviderKind::Remote {
            self.ollama.validate()?;
        }

        Ok(())
    }

    pub fn set_dimension(&mut self, dimension: u32) -> Result<(), ConfigError> {
        if !(64..=4096).contains(&dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(dimension));
        }
        self.dimension = dimension;
        Ok(())
    }
}

impl OllamaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        self.ollama_url()?;

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }

        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        Ok(())
    }

    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }

    pub fn set_host(&mut self, host: String) -> Result<(), ConfigError> {
        let temp_config = OllamaConfig {
            host: host.clone(),
            ..self.clone()
        };
        temp_config.validate()?;
        self.host = host;
        Ok(())
    }

    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidPort(port));
        }
        self.port = port;
        Ok(())
    }

    pub fn set_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.model = model;
        Ok(())
    }
}

impl RetrievalConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=50).contains(&self.top_k) {
            return Err(ConfigError::InvalidTopK(self.top_k));
        }

        if !(1..=50).contains(&self.summary_segments) {
            return Err(ConfigError::InvalidSegmentCount(
                "summary_segments",
                self.summary_segments,
            ));
        }

        if !(1..=50).contains(&self.challenge_segments) {
            return Err(ConfigError::InvalidSegmentCount(
                "challenge_segments",
                self.challenge_segments,
            ));
        }

        if !(500..=100_000).contains(&self.max_context_chars) {
            return Err(ConfigError::InvalidMaxContextChars(self.max_context_chars));
        }

        if !(1024..=10 * 1024 * 1024).contains(&self.max_upload_bytes) {
            return Err(ConfigError::InvalidMaxUploadBytes(self.max_upload_bytes));
        }

        Ok(())
    }

    pub fn set_top_k(&mut self, top_k: usize) -> Result<(), ConfigError> {
        if !(1..=50).contains(&top_k) {
            return Err(ConfigError::InvalidTopK(top_k));
        }
        self.top_k = top_k;
        Ok(())
    }
}
