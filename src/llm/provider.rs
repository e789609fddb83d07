//! LLM provider abstraction and trait definitions
//!
//! Every backend (OpenAI, Anthropic, Google, Ollama and the mock variant)
//! implements [`LlmProvider`] so the gateway can call them interchangeably.
//! Transport failures are reported as [`LlmError`], which knows whether a
//! caller-side retry is worth attempting.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// A single message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Message roles in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// LLM completion request parameters
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub response_format: ResponseFormat,
    pub metadata: HashMap<String, String>,
}

impl CompletionRequest {
    pub fn new<M: Into<String>>(model: M, messages: Vec<Message>) -> Self {
        Self {
            messages,
            model: model.into(),
            max_tokens: None,
            temperature: None,
            response_format: ResponseFormat::Text,
            metadata: HashMap::new(),
        }
    }

    /// Content of the last user message, if any
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }
}

/// LLM completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: Option<String>,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: FinishReason,
    pub metadata: HashMap<String, String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Reason why completion finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Error,
}

/// Requested output shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Plain text response
    #[default]
    Text,
    /// A single JSON object
    Json,
}

/// LLM provider trait for dependency injection and testing
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name the gateway registers it under (e.g., "openai")
    fn name(&self) -> &str;

    /// Backend actually serving the calls; differs from `name` for the mock variant
    fn vendor(&self) -> &str {
        self.name()
    }

    /// Generate a completion from the given request
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Cheap reachability probe
    async fn health_check(&self) -> Result<(), LlmError>;
}

/// LLM provider errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LlmError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Model not found: {0}")]
    ModelNotFound(String),
    #[error("Client error {status}: {message}")]
    ClientError { status: u16, message: String },
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Request cancelled")]
    Cancelled,
}

impl LlmError {
    /// Whether a caller-side retry may succeed
    ///
    /// Timeouts, connection failures, 5xx and garbled replies are transient;
    /// auth, other 4xx and malformed requests are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::ServerError { .. }
                | LlmError::NetworkError(_)
                | LlmError::Timeout(_)
                | LlmError::InvalidResponse(_)
        )
    }

    /// Short machine-readable category
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::NotConfigured(_) => "not_configured",
            LlmError::AuthenticationFailed(_) => "authentication_failed",
            LlmError::ModelNotFound(_) => "model_not_found",
            LlmError::ClientError { .. } => "client_error",
            LlmError::ServerError { .. } => "server_error",
            LlmError::InvalidRequest(_) => "invalid_request",
            LlmError::InvalidResponse(_) => "invalid_response",
            LlmError::NetworkError(_) => "network",
            LlmError::Timeout(_) => "timeout",
            LlmError::Cancelled => "cancelled",
        }
    }

    /// HTTP status that produced this error, when there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::ClientError { status, .. } | LlmError::ServerError { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Classify a non-success HTTP reply
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => LlmError::AuthenticationFailed(format!("{status} - {body}")),
            404 => LlmError::ModelNotFound(body),
            code if status.is_server_error() => LlmError::ServerError {
                status: code,
                message: body,
            },
            code => LlmError::ClientError {
                status: code,
                message: body,
            },
        }
    }

    /// Classify a transport failure
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(err.to_string())
        } else {
            LlmError::NetworkError(format!(
                "{} (is_connect: {}, is_request: {})",
                err,
                err.is_connect(),
                err.is_request()
            ))
        }
    }

    /// Whether this is a reachability failure rather than a rejected call
    pub fn is_unreachable(&self) -> bool {
        matches!(self, LlmError::NetworkError(_) | LlmError::Timeout(_))
    }
}

/// Read a failed reply body and classify it
pub(crate) async fn error_from_response(response: reqwest::Response) -> LlmError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    LlmError::from_status(status, body)
}
