//! A2A envelope - the uniform invocation wrapper
//!
//! Every worker is called through [`AgentEnvelope::execute`], which:
//!
//! 1. validates the request (ids present, target matches this agent)
//! 2. starts the clock
//! 3. runs the worker under the step deadline and the caller's cancellation
//! 4. stamps name, version and processing time into the metadata
//! 5. turns every failure, panics included, into an error [`AgentResponse`]
//!
//! `execute` has no error channel: callers always get a response back.

use crate::agent::catalog::AgentName;
use crate::agent_span;
use crate::error::AgentError;
use crate::llm::provider::TokenUsage;
use crate::observability::sink::{AgentExecutionRecord, DecisionLogSink};
use crate::routing::{serialized_size, RiskLevel};
use crate::JsonMap;
use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

/// Caller-side context carried with every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub user_id: String,
    pub task_type: String,
    pub risk_level: RiskLevel,
}

impl SystemContext {
    pub fn new<U: Into<String>, T: Into<String>>(user_id: U, task_type: T) -> Self {
        Self {
            brand_id: None,
            project_id: None,
            user_id: user_id.into(),
            task_type: task_type.into(),
            risk_level: RiskLevel::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub request_id: String,
    pub source_agent: String,
    pub target_agent: String,
    pub system_context: SystemContext,
    #[serde(default)]
    pub payload: JsonMap,
    /// Invocation options such as `model`
    #[serde(default)]
    pub options: JsonMap,
}

impl AgentRequest {
    /// Request with a fresh id
    pub fn new<S: Into<String>>(
        source_agent: S,
        target: AgentName,
        system_context: SystemContext,
        payload: JsonMap,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            source_agent: source_agent.into(),
            target_agent: target.as_str().to_string(),
            system_context,
            payload,
            options: JsonMap::new(),
        }
    }

    pub fn with_option<K: Into<String>>(mut self, key: K, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Envelope-owned metadata; workers contribute only `extra`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub agent_name: String,
    pub agent_version: String,
    pub processing_time_ms: u64,
    #[serde(flatten)]
    pub extra: JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub request_id: String,
    /// The responding agent
    pub source_agent: String,
    /// The original caller
    pub target_agent: String,
    pub status: ResponseStatus,
    pub result: JsonMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: ResponseMetadata,
}

impl AgentResponse {
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// Error response built outside any envelope, e.g. for a step that never ran
    pub fn failure(request: &AgentRequest, agent: AgentName, message: String) -> Self {
        Self {
            request_id: request.request_id.clone(),
            source_agent: agent.as_str().to_string(),
            target_agent: request.source_agent.clone(),
            status: ResponseStatus::Error,
            result: JsonMap::new(),
            error: Some(message),
            metadata: ResponseMetadata {
                agent_name: agent.as_str().to_string(),
                agent_version: agent.version().to_string(),
                processing_time_ms: 0,
                extra: JsonMap::new(),
            },
        }
    }
}

/// What worker logic hands back on success
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentOutput {
    pub result: JsonMap,
    pub token_usage: Option<TokenUsage>,
    /// Merged into the response metadata
    pub extra: JsonMap,
}

impl AgentOutput {
    pub fn new(result: JsonMap) -> Self {
        Self {
            result,
            ..Default::default()
        }
    }
}

/// Worker logic behind an envelope
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> AgentName;

    fn version(&self) -> &str {
        self.name().version()
    }

    async fn process(
        &self,
        request: &AgentRequest,
        cancel: &CancellationToken,
    ) -> Result<AgentOutput, AgentError>;
}

pub struct AgentEnvelope {
    agent: Arc<dyn Agent>,
    sink: Arc<dyn DecisionLogSink>,
    timeout: Option<Duration>,
}

impl AgentEnvelope {
    pub fn new(agent: Arc<dyn Agent>, sink: Arc<dyn DecisionLogSink>) -> Self {
        Self {
            agent,
            sink,
            timeout: None,
        }
    }

    /// Deadline for one `process` call; `None` disables it
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> AgentName {
        self.agent.name()
    }

    pub async fn execute(&self, request: AgentRequest, cancel: &CancellationToken) -> AgentResponse {
        let span = agent_span!(
            agent = %self.agent.name(),
            request_id = %request.request_id,
            source = %request.source_agent
        );
        self.execute_inner(request, cancel).instrument(span).await
    }

    async fn execute_inner(&self, request: AgentRequest, cancel: &CancellationToken) -> AgentResponse {
        let start = Instant::now();

        let outcome = match self.validate(&request) {
            Err(message) => {
                warn!(error = %message, "Rejected agent request");
                Err(message)
            }
            Ok(()) => self.run_worker(&request, cancel).await,
        };

        let processing_time_ms = start.elapsed().as_millis() as u64;
        let response = self.build_response(&request, outcome, processing_time_ms);

        debug!(
            status = ?response.status,
            processing_time_ms,
            "Agent execution finished"
        );

        self.sink.record_agent_execution(&AgentExecutionRecord {
            request_id: request.request_id.clone(),
            agent_name: self.agent.name().as_str().to_string(),
            source_agent: request.source_agent.clone(),
            target_agent: request.target_agent.clone(),
            status: response.status,
            error_message: response.error.clone(),
            execution_time_ms: processing_time_ms,
            token_usage: response
                .metadata
                .extra
                .get("token_usage")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            context_size_bytes: serialized_size(&request.payload),
        });

        response
    }

    fn validate(&self, request: &AgentRequest) -> Result<(), String> {
        if request.request_id.trim().is_empty() {
            return Err("validation failed: request_id must not be empty".to_string());
        }
        if request.source_agent.trim().is_empty() {
            return Err("validation failed: source_agent must not be empty".to_string());
        }
        let own = self.agent.name().as_str();
        if request.target_agent != own {
            return Err(format!(
                "validation failed: target_agent '{}' does not match agent '{}'",
                request.target_agent, own
            ));
        }
        Ok(())
    }

    async fn run_worker(
        &self,
        request: &AgentRequest,
        cancel: &CancellationToken,
    ) -> Result<AgentOutput, String> {
        let work = AssertUnwindSafe(self.agent.process(request, cancel)).catch_unwind();

        let bounded = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, work).await.ok(),
                None => Some(work.await),
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err("cancelled".to_string()),
            result = bounded => match result {
                None => Err(format!(
                    "timed out after {}s",
                    self.timeout.map(|t| t.as_secs_f64()).unwrap_or_default()
                )),
                Some(Ok(Ok(output))) => Ok(output),
                Some(Ok(Err(e))) => Err(e.to_string()),
                Some(Err(panic)) => {
                    let message = panic_message(panic.as_ref());
                    warn!(panic = %message, "Agent panicked");
                    Err(format!("agent panicked: {message}"))
                }
            },
        }
    }

    fn build_response(
        &self,
        request: &AgentRequest,
        outcome: Result<AgentOutput, String>,
        processing_time_ms: u64,
    ) -> AgentResponse {
        let name = self.agent.name().as_str().to_string();

        let (status, result, error, mut extra) = match outcome {
            Ok(output) => {
                let mut extra = output.extra;
                if let Some(usage) = output.token_usage {
                    extra.insert("token_usage".to_string(), json!(usage));
                }
                (ResponseStatus::Success, output.result, None, extra)
            }
            Err(message) => (ResponseStatus::Error, JsonMap::new(), Some(message), JsonMap::new()),
        };

        // Envelope-owned keys cannot be overridden by the worker
        for key in ["agent_name", "agent_version", "processing_time_ms"] {
            extra.remove(key);
        }

        AgentResponse {
            request_id: request.request_id.clone(),
            source_agent: name.clone(),
            target_agent: request.source_agent.clone(),
            status,
            result,
            error,
            metadata: ResponseMetadata {
                agent_name: name,
                agent_version: self.agent.version().to_string(),
                processing_time_ms,
                extra,
            },
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
