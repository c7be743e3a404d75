use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::generation::GenerationError;

pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Stable, machine-readable classification of an [`AssistantError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Extraction,
    Index,
    Generation,
    NotFound,
    Config,
    Internal,
}

impl ErrorKind {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Extraction => "extraction",
            Self::Index => "index",
            Self::Generation => "generation",
            Self::NotFound => "not_found",
            Self::Config => "config",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AssistantError {
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Extraction(_) => ErrorKind::Extraction,
            Self::Index(_) => ErrorKind::Index,
            Self::Generation(_) => ErrorKind::Generation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) | Self::Other(_) => ErrorKind::Internal,
        }
    }
}

pub mod challenge;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod extractor;
pub mod generation;
pub mod index;
pub mod pipeline;
pub mod retry;
pub mod session;

#[cfg(feature = "bench")]
pub mod internal {
    pub use crate::embeddings::chunking;
    pub use crate::extractor;
}
