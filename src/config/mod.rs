// Configuration management module
// TOML-backed settings for the generation backend, embeddings, chunking and retrieval

pub mod interactive;
pub mod settings;


pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    CONFIG_DIR_ENV, Config, ConfigError, EmbeddingConfig, EmbeddingProviderKind,
    GenerationConfig, OllamaConfig, RetrievalConfig,
};
