//! Orchestrator - composition root and caller-facing operations
//!
//! Builds the router, gateway, worker registry and workflow executor once and
//! exposes them through the operations the outer HTTP/CLI surface calls.
//! Failures come back as [`OrchestratorError`] with a status code attached.

use crate::agent::catalog::AgentName;
use crate::agent::envelope::{AgentRequest, AgentResponse, SystemContext};
use crate::agent::payload::TaskPayload;
use crate::agent::registry::AgentRegistry;
use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::gateway::{GenerateRequest, GenerateResponse, GenerationGateway};
use crate::health::GatewayHealth;
use crate::observability::sink::DecisionLogSink;
use crate::routing::{RouteDecision, RouteRequest, SmartRouter};
use crate::workflow::{
    render, StepType, TemplateContext, WorkflowDefinition, WorkflowExecutor, WorkflowRegistry,
    WorkflowResult,
};
use crate::JsonMap;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Source agent stamped on requests built from a routing decision
pub const ROUTER_SOURCE: &str = "smart_router";

pub struct Orchestrator {
    router: SmartRouter,
    gateway: Arc<GenerationGateway>,
    agents: Arc<AgentRegistry>,
    workflows: WorkflowRegistry,
    executor: WorkflowExecutor,
}

impl Orchestrator {
    /// Wire every service from configuration
    pub fn new(config: &OrchestratorConfig, sink: Arc<dyn DecisionLogSink>) -> Self {
        let gateway = Arc::new(GenerationGateway::from_config(config));
        let agents = Arc::new(AgentRegistry::with_generative_agents(
            gateway.clone(),
            sink.clone(),
            config.workflow.step_timeout(),
        ));

        info!(
            mode = config.gateway.mode.as_str(),
            agents = agents.len(),
            "Orchestrator ready"
        );

        Self::from_parts(
            SmartRouter::new(config, sink),
            gateway,
            agents,
            WorkflowRegistry::builtin(),
        )
    }

    /// Assemble from prebuilt services
    pub fn from_parts(
        router: SmartRouter,
        gateway: Arc<GenerationGateway>,
        agents: Arc<AgentRegistry>,
        workflows: WorkflowRegistry,
    ) -> Self {
        Self {
            router,
            gateway,
            executor: WorkflowExecutor::new(agents.clone()),
            agents,
            workflows,
        }
    }

    pub fn route(&self, request: &RouteRequest) -> RouteDecision {
        self.router.route(request)
    }

    pub async fn generate(
        &self,
        request: GenerateRequest,
        cancel: &CancellationToken,
    ) -> OrchestratorResult<GenerateResponse> {
        Ok(self.gateway.generate(request, cancel).await?)
    }

    pub async fn health_check(&self) -> GatewayHealth {
        self.gateway.health_check().await
    }

    pub fn workflows(&self) -> &WorkflowRegistry {
        &self.workflows
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    /// Run a named workflow
    ///
    /// Unknown names are 404. The initial payload is checked up front against
    /// the schema of the first step (sequential) or every step (parallel); a
    /// mismatch is 422 and no agent runs.
    pub async fn execute_workflow(
        &self,
        name: &str,
        payload: JsonMap,
        cancel: &CancellationToken,
    ) -> OrchestratorResult<WorkflowResult> {
        let definition = self
            .workflows
            .get(name)
            .ok_or_else(|| OrchestratorError::not_found("workflow", name))?;

        prevalidate(definition, &payload)?;

        Ok(self.executor.execute(definition, payload, cancel).await)
    }

    /// Invoke one agent by name through its envelope
    pub async fn invoke_agent(
        &self,
        name: &str,
        request: AgentRequest,
        cancel: &CancellationToken,
    ) -> OrchestratorResult<AgentResponse> {
        let envelope = AgentName::from_str(name)
            .ok()
            .and_then(|agent| self.agents.get(agent))
            .ok_or_else(|| OrchestratorError::not_found("agent", name))?;

        Ok(envelope.execute(request, cancel).await)
    }

    /// Route free text, then invoke the selected agent with the minimized context
    pub async fn route_and_invoke(
        &self,
        request: &RouteRequest,
        cancel: &CancellationToken,
    ) -> OrchestratorResult<(RouteDecision, AgentResponse)> {
        let decision = self.route(request);

        let mut payload = decision.minimized_context.clone();
        payload.insert("request_text".to_string(), json!(request.request_text));

        let agent_request = AgentRequest::new(
            ROUTER_SOURCE,
            decision.target_agent,
            SystemContext {
                brand_id: request.brand_id.clone(),
                project_id: request.project_id.clone(),
                user_id: request.user_id.clone(),
                task_type: decision.routing_metadata.intent.clone(),
                risk_level: decision.risk_level,
            },
            payload,
        )
        .with_option("model", Value::String(decision.selected_model.clone()));

        debug!(agent = %decision.target_agent, model = %decision.selected_model, "Invoking routed agent");
        let response = self
            .invoke_agent(decision.target_agent.as_str(), agent_request, cancel)
            .await?;

        Ok((decision, response))
    }
}

fn prevalidate(definition: &WorkflowDefinition, payload: &JsonMap) -> OrchestratorResult<()> {
    let steps = match definition.step_type {
        StepType::Sequential => &definition.steps[..definition.steps.len().min(1)],
        StepType::Parallel => &definition.steps[..],
    };

    let invalid = |message: String| OrchestratorError::InvalidWorkflowInput {
        workflow: definition.name.clone(),
        message,
    };

    for step in steps {
        let rendered = render(&step.payload_template, &TemplateContext::input_only(payload))
            .map_err(|e| invalid(e.to_string()))?;
        let mut merged = payload.clone();
        merged.extend(rendered);
        TaskPayload::parse(step.agent, &step.task, &merged).map_err(|e| invalid(e.to_string()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::MemoryDecisionLog;
    use crate::workflow::RunState;

    fn orchestrator() -> (Orchestrator, Arc<MemoryDecisionLog>) {
        let log = Arc::new(MemoryDecisionLog::new());
        (
            Orchestrator::new(&OrchestratorConfig::with_defaults(), log.clone()),
            log,
        )
    }

    fn map(value: Value) -> JsonMap {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_unknown_workflow_is_404() {
        let (orchestrator, _) = orchestrator();
        let err = orchestrator
            .execute_workflow("nope", JsonMap::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_invalid_initial_payload_is_422() {
        let (orchestrator, log) = orchestrator();
        let err = orchestrator
            .execute_workflow(
                "product_content",
                map(json!({"brand_name": "하루"})),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 422);
        assert!(err.to_string().contains("product_name"));
        assert!(log.execution_records().is_empty());
    }

    #[tokio::test]
    async fn test_parallel_workflow_validates_every_branch() {
        let (orchestrator, _) = orchestrator();
        let err = orchestrator
            .execute_workflow(
                "content_review",
                map(json!({"product_name": "텀블러"})),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidWorkflowInput { .. }));
    }

    #[tokio::test]
    async fn test_product_content_runs_end_to_end_in_mock_mode() {
        let (orchestrator, log) = orchestrator();
        let result = orchestrator
            .execute_workflow(
                "product_content",
                map(json!({"product_name": "텀블러", "target_audience": "20대 직장인"})),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(result.success, "errors: {:?}", result.errors);
        assert_eq!(result.status, RunState::Completed);
        assert_eq!(result.steps_completed, 3);
        assert_eq!(log.execution_records().len(), 3);
    }

    #[tokio::test]
    async fn test_multichannel_copy_fans_out() {
        let (orchestrator, _) = orchestrator();
        let result = orchestrator
            .execute_workflow(
                "multichannel_copy",
                map(json!({"product_name": "텀블러"})),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.results.len(), 3);
    }

    #[tokio::test]
    async fn test_invoke_unknown_agent_is_404() {
        let (orchestrator, _) = orchestrator();
        let request = AgentRequest::new(
            "cli",
            AgentName::Copywriter,
            SystemContext::new("u1", "product_copy"),
            JsonMap::new(),
        );
        let err = orchestrator
            .invoke_agent("translator", request, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "agent not found: translator");
    }

    #[tokio::test]
    async fn test_route_and_invoke_uses_selected_model() {
        let (orchestrator, log) = orchestrator();
        let (decision, response) = orchestrator
            .route_and_invoke(&RouteRequest::new("u1", "카피 작성해줘"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(decision.target_agent, AgentName::Copywriter);
        assert!(response.is_success());
        assert_eq!(response.target_agent, ROUTER_SOURCE);
        assert_eq!(response.metadata.extra["model"], decision.selected_model.as_str());
        assert_eq!(log.routing_records().len(), 1);
    }

    #[tokio::test]
    async fn test_generate_validation_maps_to_400() {
        let (orchestrator, _) = orchestrator();
        let err = orchestrator
            .generate(
                GenerateRequest::new("", "product_copy", JsonMap::new()),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
