
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{GenerationBackend, GenerationError, GenerationErrorKind, GenerationRequest};
use crate::config::{ConfigError, GenerationConfig};

/// OpenAI-compatible `/chat/completions` backend
#[derive(Debug, Clone)]
pub struct ChatClient {
    endpoint: Url,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatClient {
    #[inline]
    pub fn new(config: &GenerationConfig) -> Result<Self, ConfigError> {
        let endpoint = config.endpoint()?;

        let agent = ureq::Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(config.connect_timeout_secs)))
            .timeout_recv_response(Some(Duration::from_secs(config.read_timeout_secs)))
            .timeout_recv_body(Some(Duration::from_secs(config.read_timeout_secs)))
            .build()
            .into();

        Ok(Self {
            endpoint,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            api_key_env: config.api_key_env.clone(),
            agent,
        })
    }

    #[inline]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        serde_json::to_string(&body).map_err(|e| {
            GenerationError::new(
                GenerationErrorKind::BackendRejected,
                format!("Failed to serialize chat request: {}", e),
            )
        })
    }
}

impl GenerationBackend for ChatClient {
    #[inline]
    fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let Some(api_key) = &self.api_key else {
            return Err(GenerationError::new(
                GenerationErrorKind::Unconfigured,
                format!("No API key found in environment variable {}", self.api_key_env),
            ));
        };

        let body = self.request_body(request)?;
        debug!(
            "Sending chat completion to {} (model {}, max_tokens {})",
            self.endpoint, self.model, request.max_tokens
        );

        let mut response = self
            .agent
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .send(&body)
            .map_err(|e| classify_send_error(&e))?;

        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| classify_body_error(&e))?;

        parse_completion(&text)
    }
}

/// Map a failure before a response arrived
fn classify_send_error(error: &ureq::Error) -> GenerationError {
    let kind = match error {
        ureq::Error::Timeout(_) => GenerationErrorKind::Timeout,
        ureq::Error::StatusCode(_) => GenerationErrorKind::BackendRejected,
        // DNS, refused connection, IO and TLS setup all land here
        _ => GenerationErrorKind::ConnectionFailed,
    };
    GenerationError::new(kind, format!("Chat request failed: {}", error))
}

/// Map a failure while reading an accepted response
fn classify_body_error(error: &ureq::Error) -> GenerationError {
    let kind = match error {
        ureq::Error::Timeout(_) => GenerationErrorKind::Timeout,
        _ => GenerationErrorKind::StreamInterrupted,
    };
    GenerationError::new(kind, format!("Reading chat response failed: {}", error))
}

fn parse_completion(body: &str) -> Result<String, GenerationError> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| {
        GenerationError::new(
            GenerationErrorKind::BackendRejected,
            format!("Unparseable chat response: {}", e),
        )
    })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| {
            GenerationError::new(
                GenerationErrorKind::BackendRejected,
                "Chat response contained no message content",
            )
        })
}
