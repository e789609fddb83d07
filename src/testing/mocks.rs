//! Mock implementations for testing
//!
//! Provides a scripted LlmProvider, instrumented Agent workers and an
//! in-memory decision log so routing, envelopes and workflows can be tested
//! without any provider running.

use crate::agent::catalog::AgentName;
use crate::agent::envelope::{Agent, AgentOutput, AgentRequest};
use crate::error::AgentError;
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, TokenUsage,
};
use crate::observability::sink::{AgentExecutionRecord, DecisionLogSink, RoutingRecord};
use crate::JsonMap;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock LLM provider cycling through scripted replies
#[derive(Debug)]
pub struct MockLlmProvider {
    pub responses: Vec<String>,
    pub current_response: Arc<Mutex<usize>>,
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
    pub should_fail: bool,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            current_response: Arc::new(Mutex::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            should_fail: false,
        }
    }

    /// Provider whose calls and probes fail with a 500
    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Self::new(vec![])
        }
    }

    pub fn single_response(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if self.should_fail {
            return Err(LlmError::ServerError {
                status: 500,
                message: "Mock LLM failure".to_string(),
            });
        }

        let model = request.model.clone();
        lock(&self.requests).push(request);

        let content = {
            let mut current = lock(&self.current_response);
            let index = *current % self.responses.len().max(1);
            *current += 1;
            self.responses
                .get(index)
                .cloned()
                .unwrap_or_else(|| "Mock response".to_string())
        };

        Ok(CompletionResponse {
            content: Some(content),
            model,
            usage: TokenUsage::new(10, 5),
            finish_reason: FinishReason::Stop,
            metadata: HashMap::new(),
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        if self.should_fail {
            Err(LlmError::ServerError {
                status: 500,
                message: "Mock health check failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Worker that records every request it receives
pub struct SpyAgent {
    name: AgentName,
    result: JsonMap,
    extra: JsonMap,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<AgentRequest>>,
}

impl SpyAgent {
    pub fn new(name: AgentName) -> Self {
        let mut result = JsonMap::new();
        result.insert("agent".to_string(), json!(name.as_str()));
        result.insert("ok".to_string(), json!(true));

        Self {
            name,
            result,
            extra: JsonMap::new(),
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Replace the result object returned on every call
    pub fn with_result(mut self, result: Value) -> Self {
        if let Value::Object(map) = result {
            self.result = map;
        }
        self
    }

    pub fn with_extra<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn agent_name(&self) -> AgentName {
        self.name
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<AgentRequest> {
        lock(&self.requests).last().cloned()
    }
}

#[async_trait]
impl Agent for SpyAgent {
    fn name(&self) -> AgentName {
        self.name
    }

    async fn process(
        &self,
        request: &AgentRequest,
        _cancel: &CancellationToken,
    ) -> Result<AgentOutput, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        Ok(AgentOutput {
            result: self.result.clone(),
            token_usage: None,
            extra: self.extra.clone(),
        })
    }
}

/// Worker that always fails with the same message
pub struct FailingAgent {
    name: AgentName,
    message: String,
}

impl FailingAgent {
    pub fn new(name: AgentName, message: impl Into<String>) -> Self {
        Self {
            name,
            message: message.into(),
        }
    }
}

#[async_trait]
impl Agent for FailingAgent {
    fn name(&self) -> AgentName {
        self.name
    }

    async fn process(
        &self,
        _request: &AgentRequest,
        _cancel: &CancellationToken,
    ) -> Result<AgentOutput, AgentError> {
        Err(AgentError::failed(self.message.clone()))
    }
}

/// Worker that panics on every call
pub struct PanickingAgent {
    name: AgentName,
}

impl PanickingAgent {
    pub fn new(name: AgentName) -> Self {
        Self { name }
    }
}

#[async_trait]
impl Agent for PanickingAgent {
    fn name(&self) -> AgentName {
        self.name
    }

    async fn process(
        &self,
        _request: &AgentRequest,
        _cancel: &CancellationToken,
    ) -> Result<AgentOutput, AgentError> {
        panic!("worker exploded");
    }
}

/// Decision log that keeps every record in memory
#[derive(Debug, Default)]
pub struct MemoryDecisionLog {
    executions: Mutex<Vec<AgentExecutionRecord>>,
    routings: Mutex<Vec<RoutingRecord>>,
}

impl MemoryDecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn execution_records(&self) -> Vec<AgentExecutionRecord> {
        lock(&self.executions).clone()
    }

    pub fn routing_records(&self) -> Vec<RoutingRecord> {
        lock(&self.routings).clone()
    }
}

impl DecisionLogSink for MemoryDecisionLog {
    fn record_agent_execution(&self, record: &AgentExecutionRecord) {
        lock(&self.executions).push(record.clone());
    }

    fn record_routing(&self, record: &RoutingRecord) {
        lock(&self.routings).push(record.clone());
    }
}
