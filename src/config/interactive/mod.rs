
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::time::Duration;

use super::{
    Config, ConfigError, EmbeddingConfig, EmbeddingProviderKind, GenerationConfig, OllamaConfig,
};
use crate::embeddings::{LOCAL_MODEL_DIMENSION, LOCAL_MODEL_NAME, OllamaClient};
use crate::embeddings::chunking::ChunkUnit;
use crate::retry::BackoffPolicy;

const PROVIDERS: [EmbeddingProviderKind; 3] = [
    EmbeddingProviderKind::Local,
    EmbeddingProviderKind::Remote,
    EmbeddingProviderKind::None,
];

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 Docs QA Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Generation Backend").bold().yellow());
    eprintln!("Any OpenAI-compatible chat completions API. The key is read from the environment.");
    eprintln!();
    configure_generation(&mut config.generation)?;

    eprintln!();
    eprintln!("{}", style("Embeddings").bold().yellow());
    configure_embeddings(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Chunking & Retrieval").bold().yellow());
    configure_chunking(&mut config)?;

    if config.embeddings.provider == EmbeddingProviderKind::Remote {
        eprintln!();
        eprintln!("{}", style("Testing embedding server...").yellow());
        match test_ollama_connection(&config.embeddings) {
            Ok(()) => eprintln!(
                "{}",
                style("✓ Embedding server reachable and model available!").green()
            ),
            Err(e) => {
                eprintln!(
                    "{} {:#}",
                    style("⚠ Warning: Embedding server check failed:").yellow(),
                    e
                );
                eprintln!("You can continue, but uploads will fail until the model is served.");
            }
        }
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Generation:").bold().yellow());
    match config.generation.endpoint() {
        Ok(url) => eprintln!("  Endpoint: {}", style(url).cyan()),
        Err(e) => eprintln!("  Endpoint: {} ({})", style("Invalid").red(), e),
    }
    eprintln!("  Model: {}", style(&config.generation.model).cyan());
    let key_status = if config.generation.has_api_key() {
        style("set".to_string()).green()
    } else {
        style("not set".to_string()).red()
    };
    eprintln!(
        "  API key (${}): {}",
        config.generation.api_key_env, key_status
    );
    eprintln!(
        "  Timeouts: connect {}s, read {}s",
        style(config.generation.connect_timeout_secs).cyan(),
        style(config.generation.read_timeout_secs).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Embeddings:").bold().yellow());
    eprintln!("  Provider: {}", style(config.embeddings.provider).cyan());
    if config.embeddings.provider == EmbeddingProviderKind::Local {
        eprintln!("  Model: {}", style(LOCAL_MODEL_NAME).cyan());
        eprintln!("  Dimension: {}", style(LOCAL_MODEL_DIMENSION).cyan());
    }
    if config.embeddings.provider == EmbeddingProviderKind::Remote {
        eprintln!("  Dimension: {}", style(config.embeddings.dimension).cyan());
        match config.embeddings.ollama.ollama_url() {
            Ok(url) => eprintln!("  Server: {}", style(url).cyan()),
            Err(e) => eprintln!("  Server: {} ({})", style("Invalid").red(), e),
        }
        eprintln!("  Model: {}", style(&config.embeddings.ollama.model).cyan());
    }

    eprintln!();
    eprintln!("{}", style("Chunking & Retrieval:").bold().yellow());
    eprintln!(
        "  Chunks: {} {} with {} overlap",
        style(config.chunking.chunk_size).cyan(),
        config.chunking.unit,
        style(config.chunking.chunk_overlap).cyan()
    );
    eprintln!("  Top k: {}", style(config.retrieval.top_k).cyan());
    eprintln!(
        "  Max upload: {} bytes",
        style(config.retrieval.max_upload_bytes).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    Config::load_default().or_else(|_| {
        eprintln!(
            "{}",
            style("No existing configuration found. Using defaults.").yellow()
        );
        let base_dir = Config::config_dir()?;
        Ok(Config {
            base_dir,
            ..Config::default()
        })
    })
}

fn configure_generation(generation: &mut GenerationConfig) -> Result<()> {
    let api_base: String = Input::new()
        .with_prompt("API base URL")
        .default(generation.api_base.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = GenerationConfig {
                api_base: input.clone(),
                ..GenerationConfig::default()
            };
            temp_config.endpoint()?;
            Ok(())
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Generation model")
        .default(generation.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    generation.set_api_base(api_base)?;
    generation.set_model(model)?;

    Ok(())
}

fn configure_embeddings(config: &mut Config) -> Result<()> {
    let default_index = provider_index(config.embeddings.provider);
    let labels = [
        "local (all-MiniLM-L6-v2, runs in-process)",
        "remote (Ollama-compatible server)",
        "none (document order)",
    ];

    let selected = Select::new()
        .with_prompt("Embedding provider")
        .default(default_index)
        .items(&labels)
        .interact()?;
    config.embeddings.provider = PROVIDERS[selected];

    if config.embeddings.provider == EmbeddingProviderKind::Remote {
        configure_ollama(&mut config.embeddings.ollama)?;

        let dimension: u32 = Input::new()
            .with_prompt("Embedding dimension reported by the model")
            .default(config.embeddings.dimension)
            .interact_text()?;
        config.embeddings.set_dimension(dimension)?;
    }

    Ok(())
}

fn configure_ollama(ollama: &mut OllamaConfig) -> Result<()> {
    let host: String = Input::new()
        .with_prompt("Embedding server host")
        .default(ollama.host.clone())
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Embedding server port")
        .default(ollama.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(ollama.model.clone())
        .interact_text()?;

    ollama.set_port(port)?;
    ollama.set_host(host)?;
    ollama.set_model(model)?;

    Ok(())
}

fn configure_chunking(config: &mut Config) -> Result<()> {
    let units = [ChunkUnit::Tokens, ChunkUnit::Characters];
    let default_unit = units
        .iter()
        .position(|unit| *unit == config.chunking.unit)
        .unwrap_or(0);
    let unit_index = Select::new()
        .with_prompt("Chunk unit")
        .default(default_unit)
        .items(&["tokens", "characters"])
        .interact()?;
    config.chunking.unit = units[unit_index];

    config.chunking.chunk_size = Input::new()
        .with_prompt("Chunk size")
        .default(config.chunking.chunk_size)
        .interact_text()?;

    config.chunking.chunk_overlap = Input::new()
        .with_prompt("Chunk overlap")
        .default(config.chunking.chunk_overlap)
        .interact_text()?;

    let top_k: usize = Input::new()
        .with_prompt("Segments retrieved per question")
        .default(config.retrieval.top_k)
        .interact_text()?;
    config.retrieval.set_top_k(top_k)?;

    config.validate()?;
    Ok(())
}

fn provider_index(provider: EmbeddingProviderKind) -> usize {
    PROVIDERS
        .iter()
        .position(|candidate| *candidate == provider)
        .unwrap_or(0)
}

/// Reach the embedding server once and confirm it serves the configured model
fn test_ollama_connection(embeddings: &EmbeddingConfig) -> Result<()> {
    OllamaClient::new(embeddings)?
        .with_timeout(Duration::from_secs(5))
        .with_policy(BackoffPolicy {
            max_attempts: 1,
            ..BackoffPolicy::default()
        })
        .health_check()
}
