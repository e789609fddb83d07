//! Error taxonomy for the orchestration core
//!
//! Every failure the core can surface is mapped onto one of the caller-facing
//! categories (validation, provider, not found, cancelled, internal) and the
//! status code the outer HTTP/CLI surface reports for it.

use crate::config::ConfigError;
use crate::gateway::GenerateError;
use crate::llm::provider::LlmError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Top-level error returned by the [`Orchestrator`](crate::orchestrator::Orchestrator) operations
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid input for workflow '{workflow}': {message}")]
    InvalidWorkflowInput { workflow: String, message: String },

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("{kind} not found: {name}")]
    NotFound { kind: String, name: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {message}")]
    InternalError { message: String },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}

/// Serializable error body handed to the outer surface
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub status: u16,
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl OrchestratorError {
    /// Status code the outer surface reports for this error
    pub fn status_code(&self) -> u16 {
        match self {
            OrchestratorError::Validation { .. } => 400,
            OrchestratorError::InvalidWorkflowInput { .. } => 422,
            OrchestratorError::Provider(_) => 503,
            OrchestratorError::NotFound { .. } => 404,
            OrchestratorError::Cancelled => 499,
            OrchestratorError::InternalError { .. } | OrchestratorError::ConfigError(_) => 500,
        }
    }

    /// Short machine-readable category name
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorError::Validation { .. } => "validation_error",
            OrchestratorError::InvalidWorkflowInput { .. } => "invalid_workflow_input",
            OrchestratorError::Provider(_) => "provider_error",
            OrchestratorError::NotFound { .. } => "not_found",
            OrchestratorError::Cancelled => "cancelled",
            OrchestratorError::InternalError { .. } => "internal_error",
            OrchestratorError::ConfigError(_) => "config_error",
        }
    }

    /// Convert into the sanitized body shown to callers
    pub fn to_error_body(&self) -> ErrorBody {
        let retryable = match self {
            OrchestratorError::Provider(e) => Some(e.retryable),
            _ => None,
        };

        ErrorBody {
            status: self.status_code(),
            kind: self.kind().to_string(),
            message: sanitize_error_message(&self.to_string()),
            retryable,
        }
    }

    /// Create validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create not-found error for a named resource
    pub fn not_found<K: Into<String>, N: Into<String>>(kind: K, name: N) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create internal error
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

impl From<GenerateError> for OrchestratorError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::Validation { message } => Self::Validation { message },
            GenerateError::Provider(e) => Self::Provider(e),
            GenerateError::Cancelled => Self::Cancelled,
        }
    }
}

/// Backend provider failure, classified for caller-side retry decisions
///
/// The gateway never retries on its own; `retryable` tells the caller whether a
/// bounded retry is worth attempting.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[error("{provider}: {message}")]
pub struct ProviderError {
    pub provider: String,
    pub message: String,
    pub details: Value,
    pub retryable: bool,
}

impl ProviderError {
    pub fn new<P: Into<String>, M: Into<String>>(
        provider: P,
        message: M,
        details: Value,
        retryable: bool,
    ) -> Self {
        Self {
            provider: provider.into(),
            message: message.into(),
            details,
            retryable,
        }
    }

    /// Classify a transport-level provider failure
    pub fn from_llm_error(provider: &str, err: &LlmError) -> Self {
        let mut details = json!({ "kind": err.kind() });
        if let Some(status) = err.status() {
            details["status"] = json!(status);
        }

        Self {
            provider: provider.to_string(),
            message: err.to_string(),
            details,
            retryable: err.is_retryable(),
        }
    }
}

/// Failure raised by worker logic inside an agent envelope
///
/// Never crosses the envelope boundary; the envelope converts it into an
/// error `AgentResponse`.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerateError),

    #[error("{message}")]
    Failed { message: String },
}

impl AgentError {
    /// Create invalid payload error
    pub fn invalid_payload<S: Into<String>>(message: S) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }

    /// Create a generic worker failure
    pub fn failed<S: Into<String>>(message: S) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+").expect("secret pattern is valid")
});

static SENSITIVE_PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
        .expect("path pattern is valid")
});

const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Redact credentials and credential paths, then cap the message length
pub fn sanitize_error_message(message: &str) -> String {
    let redacted = SECRET_PATTERN.replace_all(message, "${1}=***");
    let mut sanitized = SENSITIVE_PATH_PATTERN
        .replace_all(&redacted, "/***REDACTED***/")
        .to_string();

    if sanitized.len() > MAX_ERROR_MESSAGE_LEN {
        let truncate_suffix = "...[truncated]";
        let mut cut = MAX_ERROR_MESSAGE_LEN - truncate_suffix.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized = format!("{}{}", &sanitized[..cut], truncate_suffix);
    }

    sanitized
}

/// Result type for orchestrator operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
