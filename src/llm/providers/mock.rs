//! Offline provider variant used in mock mode
//!
//! Registered under each vendor name so routing and resolution behave exactly
//! as in live mode, while every call is answered locally and deterministically.

use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, ResponseFormat,
    TokenUsage,
};
use async_trait::async_trait;
use serde_json::json;

const PREVIEW_CHARS: usize = 120;

/// Deterministic stand-in for a live provider
#[derive(Debug, Clone)]
pub struct MockProvider {
    name: String,
}

impl MockProvider {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }

    /// Rough token estimate, four bytes per token
    fn estimate_tokens(text: &str) -> u32 {
        u32::try_from(text.len() / 4).unwrap_or(u32::MAX)
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn vendor(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if request.messages.is_empty() {
            return Err(LlmError::InvalidRequest(
                "at least one message is required".to_string(),
            ));
        }

        let prompt = request.last_user_content().unwrap_or_default();
        let preview: String = prompt.chars().take(PREVIEW_CHARS).collect();

        let content = match request.response_format {
            ResponseFormat::Json => json!({
                "mock": true,
                "provider": self.name,
                "model": request.model,
                "summary": preview,
            })
            .to_string(),
            ResponseFormat::Text => format!("[mock {}/{}] {}", self.name, request.model, preview),
        };

        let prompt_tokens = request
            .messages
            .iter()
            .map(|m| Self::estimate_tokens(&m.content))
            .sum();

        Ok(CompletionResponse {
            usage: TokenUsage::new(prompt_tokens, Self::estimate_tokens(&content)),
            content: Some(content),
            model: request.model,
            finish_reason: FinishReason::Stop,
            metadata: request.metadata,
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        Ok(())
    }
}
