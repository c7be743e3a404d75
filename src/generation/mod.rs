// Generation module
// Text generation against a chat backend, wrapped in bounded retry

pub mod chat;

#[cfg(test)]
pub(crate) mod testing;
#[cfg(test)]
mod tests;

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ConfigError, GenerationConfig};
use crate::retry::retry_with_backoff;

pub use chat::ChatClient;
pub use crate::retry::{BackoffPolicy, Sleeper, ThreadSleeper};

/// Token budget for question answering
pub const QA_MAX_TOKENS: u32 = 400;
/// Token budget for challenge question generation
pub const CHALLENGE_MAX_TOKENS: u32 = 400;
/// Token budget for answer evaluation
pub const EVALUATION_MAX_TOKENS: u32 = 300;

pub const QA_TEMPERATURE: f32 = 0.3;
pub const SUMMARY_TEMPERATURE: f32 = 0.3;
pub const CHALLENGE_TEMPERATURE: f32 = 0.5;
pub const EVALUATION_TEMPERATURE: f32 = 0.3;

/// Token budget for a summary of `target_words` words
#[inline]
pub fn summary_token_budget(target_words: u32) -> u32 {
    match target_words {
        0..=200 => target_words * 2 + 200,
        201..=400 => target_words * 5 / 2 + 300,
        _ => target_words.saturating_mul(3).saturating_add(500),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    Timeout,
    ConnectionFailed,
    StreamInterrupted,
    BackendRejected,
    Unconfigured,
}

impl std::fmt::Display for GenerationErrorKind {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::ConnectionFailed => "connection failed",
            Self::StreamInterrupted => "stream interrupted",
            Self::BackendRejected => "backend rejected",
            Self::Unconfigured => "unconfigured",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Generation failed ({kind}) after {attempts} attempt(s): {message}")]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    pub message: String,
    pub attempts: u32,
}

impl GenerationError {
    #[inline]
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            attempts: 1,
        }
    }

    fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A single-shot completion backend. Retry is layered on top by [`ResilientGenerator`].
pub trait GenerationBackend: Send + Sync + std::fmt::Debug {
    fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Generator that retries transient backend failures with exponential backoff
#[derive(Debug, Clone)]
pub struct ResilientGenerator {
    backend: Arc<dyn GenerationBackend>,
    policy: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl ResilientGenerator {
    #[inline]
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            policy: BackoffPolicy::default(),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Generator backed by the configured chat completions endpoint
    #[inline]
    pub fn from_config(config: &GenerationConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(Arc::new(ChatClient::new(config)?)))
    }

    #[inline]
    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[inline]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[inline]
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    #[inline]
    pub fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let request = GenerationRequest {
            prompt: prompt.to_string(),
            max_tokens,
            temperature,
        };

        retry_with_backoff(
            &self.policy,
            self.sleeper.as_ref(),
            || self.backend.complete(&request),
            |failure| self.policy.is_retryable(failure.kind),
        )
        .map_err(|exhausted| exhausted.error.with_attempts(exhausted.attempts))
    }
}
