//! GenerationGateway - one entry point for every model call
//!
//! Resolves (provider, model) from role/task or an explicit model, invokes the
//! provider once, and normalizes the reply. Failures come back classified as
//! [`ProviderError`] with a `retryable` flag; the gateway never retries.

use super::output::extract_json;
use super::prompts::{system_prompt, user_prompt};
use super::registry::{build_providers, ProviderMap, ProviderSet};
use super::resolver::{ProviderResolver, Resolution};
use crate::config::{GatewayMode, OrchestratorConfig};
use crate::error::ProviderError;
use crate::health::{probe_all, GatewayHealth, HealthStatus, ProviderHealth};
use crate::llm::provider::{CompletionRequest, LlmError, Message, ResponseFormat, TokenUsage};
use crate::provider_span;
use crate::JsonMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument};

/// Requested output shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    #[default]
    Json,
    Text,
}

impl GenerationMode {
    fn response_format(self) -> ResponseFormat {
        match self {
            GenerationMode::Json => ResponseFormat::Json,
            GenerationMode::Text => ResponseFormat::Text,
        }
    }
}

/// Sampling overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub role: String,
    pub task: String,
    #[serde(default)]
    pub payload: JsonMap,
    #[serde(default)]
    pub mode: GenerationMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

impl GenerateRequest {
    pub fn new<R: Into<String>, T: Into<String>>(role: R, task: T, payload: JsonMap) -> Self {
        Self {
            role: role.into(),
            task: task.into(),
            payload,
            mode: GenerationMode::Json,
            override_model: None,
            options: None,
        }
    }

    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_override_model<S: Into<String>>(mut self, model: S) -> Self {
        self.override_model = Some(model.into());
        self
    }

    fn validate(&self) -> Result<(), GenerateError> {
        if self.role.trim().is_empty() {
            return Err(GenerateError::validation("role must not be empty"));
        }
        if self.task.trim().is_empty() {
            return Err(GenerateError::validation("task must not be empty"));
        }
        if let Some(options) = &self.options {
            if let Some(t) = options.temperature {
                if !(0.0..=2.0).contains(&t) {
                    return Err(GenerateError::validation(format!(
                        "temperature must be within 0.0..=2.0, got {t}"
                    )));
                }
            }
            if options.max_tokens == Some(0) {
                return Err(GenerateError::validation("max_tokens must be positive"));
            }
        }
        Ok(())
    }
}

/// Normalized model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOutput {
    #[serde(rename = "type")]
    pub output_type: GenerationMode,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub provider: String,
    pub model: String,
    pub usage: TokenUsage,
    pub output: GenerateOutput,
    pub meta: JsonMap,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("cancelled")]
    Cancelled,
}

impl GenerateError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerateError::Provider(e) if e.retryable)
    }
}

pub struct GenerationGateway {
    mode: GatewayMode,
    providers: ProviderMap,
    /// Configured providers that could not be built
    unavailable: BTreeMap<String, LlmError>,
    resolver: ProviderResolver,
    health_timeout: Duration,
}

impl GenerationGateway {
    pub fn new(
        mode: GatewayMode,
        providers: ProviderMap,
        resolver: ProviderResolver,
        health_timeout: Duration,
    ) -> Self {
        Self {
            mode,
            providers,
            unavailable: BTreeMap::new(),
            resolver,
            health_timeout,
        }
    }

    /// Record configured providers that failed to build, keyed by section name
    pub fn with_unavailable(mut self, unavailable: BTreeMap<String, LlmError>) -> Self {
        self.unavailable = unavailable;
        self
    }

    /// Build providers and resolver from configuration
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        let ProviderSet {
            providers,
            unavailable,
        } = build_providers(config);

        Self::new(
            config.gateway.mode,
            providers,
            ProviderResolver::new(config.gateway.default_provider.clone(), config.models.clone()),
            config.gateway.health_timeout(),
        )
        .with_unavailable(unavailable)
    }

    pub fn mode(&self) -> GatewayMode {
        self.mode
    }

    pub fn resolver(&self) -> &ProviderResolver {
        &self.resolver
    }

    pub fn resolve(&self, request: &GenerateRequest) -> Resolution {
        self.resolver.resolve(
            &request.role,
            &request.task,
            request.override_model.as_deref(),
        )
    }

    pub async fn generate(
        &self,
        request: GenerateRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerateResponse, GenerateError> {
        request.validate()?;

        let resolution = self.resolve(&request);
        let span = provider_span!(
            provider = %resolution.provider,
            model = %resolution.model,
            role = %request.role,
            task = %request.task
        );

        self.generate_resolved(request, resolution, cancel)
            .instrument(span)
            .await
    }

    async fn generate_resolved(
        &self,
        request: GenerateRequest,
        resolution: Resolution,
        cancel: &CancellationToken,
    ) -> Result<GenerateResponse, GenerateError> {
        let provider = self.providers.get(&resolution.provider).ok_or_else(|| {
            let message = match self.unavailable.get(&resolution.provider) {
                Some(reason) => format!("provider '{}' is unavailable: {reason}", resolution.provider),
                None => format!("provider '{}' is not configured", resolution.provider),
            };
            ProviderError::new(
                resolution.provider.clone(),
                message,
                json!({"kind": "not_configured"}),
                false,
            )
        })?;

        let mut completion = CompletionRequest::new(
            resolution.model.clone(),
            vec![
                Message::system(system_prompt(&request.role, &request.task, request.mode)),
                Message::user(user_prompt(&request.task, &request.payload)),
            ],
        );
        completion.response_format = request.mode.response_format();
        if let Some(options) = &request.options {
            completion.temperature = options.temperature;
            completion.max_tokens = options.max_tokens;
        }
        completion
            .metadata
            .insert("role".to_string(), request.role.clone());
        completion
            .metadata
            .insert("task".to_string(), request.task.clone());

        let start = Instant::now();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LlmError::Cancelled),
            result = provider.complete(completion) => result,
        };
        let latency_ms = start.elapsed().as_millis() as u64;

        let response = result.map_err(|e| match e {
            LlmError::Cancelled => GenerateError::Cancelled,
            other => {
                warn!(error = %other, retryable = other.is_retryable(), "Generation failed");
                GenerateError::Provider(ProviderError::from_llm_error(&resolution.provider, &other))
            }
        })?;

        let content = response.content.unwrap_or_default();
        let value = match request.mode {
            GenerationMode::Json => extract_json(&content).ok_or_else(|| {
                let err = LlmError::InvalidResponse("model output is not valid JSON".to_string());
                ProviderError::from_llm_error(&resolution.provider, &err)
            })?,
            GenerationMode::Text => Value::String(content),
        };

        debug!(
            latency_ms,
            total_tokens = response.usage.total_tokens,
            "Generation completed"
        );

        let mut meta = JsonMap::new();
        meta.insert("role".to_string(), json!(request.role));
        meta.insert("task".to_string(), json!(request.task));
        meta.insert("vendor".to_string(), json!(provider.vendor()));
        meta.insert("finish_reason".to_string(), json!(response.finish_reason));
        meta.insert("latency_ms".to_string(), json!(latency_ms));
        if let Some(tier) = resolution.tier {
            meta.insert("tier".to_string(), json!(tier));
        }

        Ok(GenerateResponse {
            provider: resolution.provider,
            model: resolution.model,
            usage: response.usage,
            output: GenerateOutput {
                output_type: request.mode,
                value,
            },
            meta,
        })
    }

    /// Probe every configured provider; never fails
    ///
    /// Sections that could not be built are reported as unhealthy without
    /// contacting the vendor.
    pub async fn health_check(&self) -> GatewayHealth {
        let mut providers = probe_all(&self.providers, self.health_timeout).await;
        for (name, reason) in &self.unavailable {
            providers.insert(
                name.clone(),
                ProviderHealth {
                    status: HealthStatus::Unhealthy,
                    vendor: name.clone(),
                    message: Some(reason.to_string()),
                    response_time_ms: 0,
                },
            );
        }
        GatewayHealth::new(self.mode.as_str(), providers)
    }
}
