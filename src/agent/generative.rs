//! Stock worker behind every catalog agent

use crate::agent::catalog::AgentName;
use crate::agent::envelope::{Agent, AgentOutput, AgentRequest};
use crate::agent::payload::TaskPayload;
use crate::error::AgentError;
use crate::gateway::{GenerateRequest, GenerationGateway, GenerationMode};
use crate::JsonMap;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Worker that validates its payload and asks the gateway for JSON output
///
/// Role is the agent name, task is the request's `task_type`. A `model`
/// option on the request overrides tier-based model resolution.
pub struct GenerativeAgent {
    name: AgentName,
    gateway: Arc<GenerationGateway>,
}

impl GenerativeAgent {
    pub fn new(name: AgentName, gateway: Arc<GenerationGateway>) -> Self {
        Self { name, gateway }
    }
}

#[async_trait]
impl Agent for GenerativeAgent {
    fn name(&self) -> AgentName {
        self.name
    }

    async fn process(
        &self,
        request: &AgentRequest,
        cancel: &CancellationToken,
    ) -> Result<AgentOutput, AgentError> {
        let task = &request.system_context.task_type;
        let typed = TaskPayload::parse(self.name, task, &request.payload)?;
        debug!(agent = %self.name, task = %task, opaque = typed.is_opaque(), "Payload accepted");

        let mut generate = GenerateRequest::new(self.name.as_str(), task.clone(), request.payload.clone())
            .with_mode(GenerationMode::Json);
        if let Some(model) = request.options.get("model").and_then(Value::as_str) {
            generate = generate.with_override_model(model);
        }

        let response = self.gateway.generate(generate, cancel).await?;

        let result = match response.output.value {
            Value::Object(map) => map,
            other => {
                let mut map = JsonMap::new();
                map.insert("content".to_string(), other);
                map
            }
        };

        let mut extra = JsonMap::new();
        extra.insert("provider".to_string(), json!(response.provider));
        extra.insert("model".to_string(), json!(response.model));

        Ok(AgentOutput {
            result,
            token_usage: Some(response.usage),
            extra,
        })
    }
}
