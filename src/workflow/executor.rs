//! WorkflowExecutor - runs a definition as one in-memory pipeline
//!
//! Sequential runs are fail-fast: the first error response stops the run and
//! later steps are never invoked. Parallel runs dispatch every step at once,
//! keep every response, and succeed only when every branch succeeds.

use super::definition::{StepType, WorkflowDefinition, WorkflowStep};
use super::template::{render, TemplateContext};
use crate::agent::envelope::{AgentRequest, AgentResponse, SystemContext};
use crate::agent::registry::AgentRegistry;
use crate::routing::RiskLevel;
use crate::workflow_span;
use crate::JsonMap;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// Source agent stamped on every request the executor builds
pub const EXECUTOR_SOURCE: &str = "workflow_executor";

const ANONYMOUS_USER: &str = "anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub workflow_name: String,
    pub started_at: DateTime<Utc>,
    pub success: bool,
    pub status: RunState,
    pub steps_completed: usize,
    pub total_steps: usize,
    pub results: Vec<AgentResponse>,
    pub errors: Vec<String>,
    pub total_elapsed_seconds: f64,
}

pub struct WorkflowExecutor {
    agents: Arc<AgentRegistry>,
}

impl WorkflowExecutor {
    pub fn new(agents: Arc<AgentRegistry>) -> Self {
        Self { agents }
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    /// Run a workflow to completion or first failure; never fails itself
    pub async fn execute(
        &self,
        definition: &WorkflowDefinition,
        initial: JsonMap,
        cancel: &CancellationToken,
    ) -> WorkflowResult {
        let run_id = Uuid::new_v4();
        let span = workflow_span!(
            workflow = %definition.name,
            run_id = %run_id,
            step_type = ?definition.step_type,
            total_steps = definition.total_steps()
        );

        async {
            let start = Instant::now();
            let mut run = RunAccumulator::new(definition);
            debug!(state = ?run.state, "Workflow created");

            run.state = RunState::Running;
            info!("Workflow started");

            match definition.step_type {
                StepType::Sequential => self.run_sequential(definition, &initial, cancel, &mut run).await,
                StepType::Parallel => self.run_parallel(definition, &initial, cancel, &mut run).await,
            }

            let result = run.finish(start.elapsed().as_secs_f64());
            if result.success {
                info!(
                    steps_completed = result.steps_completed,
                    elapsed_s = result.total_elapsed_seconds,
                    "Workflow completed"
                );
            } else {
                warn!(
                    steps_completed = result.steps_completed,
                    errors = ?result.errors,
                    "Workflow failed"
                );
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_sequential(
        &self,
        definition: &WorkflowDefinition,
        initial: &JsonMap,
        cancel: &CancellationToken,
        run: &mut RunAccumulator,
    ) {
        let mut step_results: Vec<JsonMap> = Vec::with_capacity(definition.steps.len());
        let mut outputs = JsonMap::new();

        for (index, step) in definition.steps.iter().enumerate() {
            if cancel.is_cancelled() {
                run.fail(index, step, "cancelled");
                return;
            }

            let context = TemplateContext {
                input: initial,
                steps: &step_results,
                outputs: &outputs,
            };
            let rendered = match render(&step.payload_template, &context) {
                Ok(rendered) => rendered,
                Err(e) => {
                    run.fail(index, step, &e.to_string());
                    return;
                }
            };

            let Some(envelope) = self.agents.get(step.agent) else {
                run.fail(index, step, "agent is not registered");
                return;
            };

            let payload = merge(&[initial, &outputs, &rendered]);
            let request = build_request(step, initial, payload);
            debug!(step = index, agent = %step.agent, task = %step.task, "Dispatching step");

            let response = envelope.execute(request, cancel).await;
            if !response.is_success() {
                let message = response.error.unwrap_or_else(|| "unknown error".to_string());
                run.fail(index, step, &message);
                return;
            }

            outputs.insert(
                step.agent.as_str().to_string(),
                Value::Object(response.result.clone()),
            );
            step_results.push(response.result.clone());
            run.succeed(response);
        }
    }

    async fn run_parallel(
        &self,
        definition: &WorkflowDefinition,
        initial: &JsonMap,
        cancel: &CancellationToken,
        run: &mut RunAccumulator,
    ) {
        let branches = definition
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.run_branch(index, step, initial, cancel));

        for (index, response) in join_all(branches).await.into_iter().enumerate() {
            if response.is_success() {
                run.succeed(response);
            } else {
                let step = &definition.steps[index];
                let message = response.error.clone().unwrap_or_else(|| "unknown error".to_string());
                run.errors.push(step_error(index, step, &message));
                run.results.push(response);
            }
        }
    }

    async fn run_branch(
        &self,
        index: usize,
        step: &WorkflowStep,
        initial: &JsonMap,
        cancel: &CancellationToken,
    ) -> AgentResponse {
        let rendered = render(&step.payload_template, &TemplateContext::input_only(initial));
        let request = build_request(step, initial, initial.clone());

        let rendered = match rendered {
            Ok(rendered) => rendered,
            Err(e) => return AgentResponse::failure(&request, step.agent, e.to_string()),
        };
        let Some(envelope) = self.agents.get(step.agent) else {
            return AgentResponse::failure(&request, step.agent, "agent is not registered".to_string());
        };

        let request = AgentRequest {
            payload: merge(&[initial, &rendered]),
            ..request
        };
        debug!(step = index, agent = %step.agent, task = %step.task, "Dispatching branch");
        envelope.execute(request, cancel).await
    }
}

/// Per-run accumulator, owned by the task executing the run
struct RunAccumulator {
    workflow_name: String,
    started_at: DateTime<Utc>,
    total_steps: usize,
    state: RunState,
    results: Vec<AgentResponse>,
    errors: Vec<String>,
    steps_completed: usize,
}

impl RunAccumulator {
    fn new(definition: &WorkflowDefinition) -> Self {
        Self {
            workflow_name: definition.name.clone(),
            started_at: Utc::now(),
            total_steps: definition.total_steps(),
            state: RunState::Pending,
            results: Vec::new(),
            errors: Vec::new(),
            steps_completed: 0,
        }
    }

    fn succeed(&mut self, response: AgentResponse) {
        self.steps_completed += 1;
        self.results.push(response);
    }

    fn fail(&mut self, index: usize, step: &WorkflowStep, message: &str) {
        warn!(step = index, agent = %step.agent, error = %message, "Step failed");
        self.errors.push(step_error(index, step, message));
        self.state = RunState::Failed;
    }

    fn finish(mut self, elapsed_seconds: f64) -> WorkflowResult {
        let success = self.errors.is_empty() && self.steps_completed == self.total_steps;
        self.state = if success {
            RunState::Completed
        } else {
            RunState::Failed
        };

        WorkflowResult {
            workflow_name: self.workflow_name,
            started_at: self.started_at,
            success,
            status: self.state,
            steps_completed: self.steps_completed,
            total_steps: self.total_steps,
            results: self.results,
            errors: self.errors,
            total_elapsed_seconds: elapsed_seconds,
        }
    }
}

fn step_error(index: usize, step: &WorkflowStep, message: &str) -> String {
    format!("step {} ({}/{}): {}", index + 1, step.agent, step.task, message)
}

/// Shallow merge; later maps win on key conflicts
fn merge(layers: &[&JsonMap]) -> JsonMap {
    let mut merged = JsonMap::new();
    for layer in layers {
        for (key, value) in layer.iter() {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

fn string_field(payload: &JsonMap, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn build_request(step: &WorkflowStep, initial: &JsonMap, payload: JsonMap) -> AgentRequest {
    let system_context = SystemContext {
        brand_id: string_field(initial, "brand_id"),
        project_id: string_field(initial, "project_id"),
        user_id: string_field(initial, "user_id").unwrap_or_else(|| ANONYMOUS_USER.to_string()),
        task_type: step.task.clone(),
        risk_level: RiskLevel::Low,
    };

    AgentRequest {
        options: step.options.clone(),
        ..AgentRequest::new(EXECUTOR_SOURCE, step.agent, system_context, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::catalog::AgentName;
    use crate::testing::mocks::{FailingAgent, MemoryDecisionLog, SpyAgent};
    use serde_json::json;
    use std::time::Duration;

    fn map(value: Value) -> JsonMap {
        value.as_object().cloned().unwrap()
    }

    fn registry_with(spies: &[Arc<SpyAgent>]) -> AgentRegistry {
        let sink = Arc::new(MemoryDecisionLog::new());
        let mut registry = AgentRegistry::new();
        for spy in spies {
            registry.register_agent(spy.clone(), sink.clone(), None);
        }
        registry
    }

    fn three_step(step_type: StepType) -> WorkflowDefinition {
        WorkflowDefinition::new(
            "test_flow",
            "three steps",
            step_type,
            vec![
                WorkflowStep::new(AgentName::Strategist, "product_strategy"),
                WorkflowStep::new(AgentName::Copywriter, "product_copy")
                    .with_template(json!({"strategy": "{{strategist}}"})),
                WorkflowStep::new(AgentName::Reviewer, "content_review")
                    .with_template(json!({"content": "{{steps.1}}"})),
            ],
        )
    }

    #[tokio::test]
    async fn test_sequential_threads_outputs_forward() {
        let strategist = Arc::new(
            SpyAgent::new(AgentName::Strategist).with_result(json!({"positioning": "친환경"})),
        );
        let copywriter = Arc::new(SpyAgent::new(AgentName::Copywriter));
        let reviewer = Arc::new(SpyAgent::new(AgentName::Reviewer));
        let executor = WorkflowExecutor::new(Arc::new(registry_with(&[
            strategist.clone(),
            copywriter.clone(),
            reviewer.clone(),
        ])));

        let result = executor
            .execute(
                &three_step(StepType::Sequential),
                map(json!({"product_name": "텀블러", "user_id": "u-7"})),
                &CancellationToken::new(),
            )
            .await;

        assert!(result.success);
        assert_eq!(result.status, RunState::Completed);
        assert_eq!(result.steps_completed, 3);
        assert_eq!(result.results.len(), 3);
        assert!(result.errors.is_empty());

        let copy_request = copywriter.last_request().unwrap();
        assert_eq!(copy_request.payload["strategy"], json!({"positioning": "친환경"}));
        assert_eq!(copy_request.payload["product_name"], "텀블러");
        assert_eq!(copy_request.source_agent, EXECUTOR_SOURCE);
        assert_eq!(copy_request.system_context.user_id, "u-7");
        assert_eq!(copy_request.system_context.task_type, "product_copy");
    }

    #[tokio::test]
    async fn test_sequential_fail_fast() {
        let strategist = Arc::new(SpyAgent::new(AgentName::Strategist));
        let reviewer = Arc::new(SpyAgent::new(AgentName::Reviewer));
        let sink = Arc::new(MemoryDecisionLog::new());
        let mut registry = registry_with(&[strategist.clone(), reviewer.clone()]);
        registry.register_agent(
            Arc::new(FailingAgent::new(AgentName::Copywriter, "copy model refused")),
            sink,
            None,
        );
        let executor = WorkflowExecutor::new(Arc::new(registry));

        let result = executor
            .execute(
                &three_step(StepType::Sequential),
                map(json!({"product_name": "텀블러"})),
                &CancellationToken::new(),
            )
            .await;

        assert!(!result.success);
        assert_eq!(result.status, RunState::Failed);
        assert_eq!(result.steps_completed, 1);
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("copy model refused"));
        assert_eq!(strategist.call_count(), 1);
        assert_eq!(reviewer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_sequential_missing_agent_fails_run() {
        let strategist = Arc::new(SpyAgent::new(AgentName::Strategist));
        let executor = WorkflowExecutor::new(Arc::new(registry_with(&[strategist])));

        let result = executor
            .execute(
                &three_step(StepType::Sequential),
                JsonMap::new(),
                &CancellationToken::new(),
            )
            .await;

        assert!(!result.success);
        assert_eq!(result.steps_completed, 1);
        assert!(result.errors[0].contains("not registered"));
    }

    #[tokio::test]
    async fn test_parallel_keeps_every_response() {
        let strategist = Arc::new(SpyAgent::new(AgentName::Strategist));
        let reviewer = Arc::new(SpyAgent::new(AgentName::Reviewer));
        let mut registry = registry_with(&[strategist.clone(), reviewer.clone()]);
        registry.register_agent(
            Arc::new(FailingAgent::new(AgentName::Copywriter, "branch down")),
            Arc::new(MemoryDecisionLog::new()),
            None,
        );
        let executor = WorkflowExecutor::new(Arc::new(registry));

        let definition = WorkflowDefinition::new(
            "fan_out",
            "three branches",
            StepType::Parallel,
            vec![
                WorkflowStep::new(AgentName::Strategist, "product_strategy"),
                WorkflowStep::new(AgentName::Copywriter, "product_copy"),
                WorkflowStep::new(AgentName::Reviewer, "content_review"),
            ],
        );

        let result = executor
            .execute(&definition, map(json!({"content": "초안"})), &CancellationToken::new())
            .await;

        assert!(!result.success);
        assert_eq!(result.results.len(), 3);
        assert_eq!(result.steps_completed, 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.results[1].source_agent, "copywriter");
        assert_eq!(result.results[1].error.as_deref(), Some("branch down"));
        assert_eq!(reviewer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_parallel_branches_run_concurrently() {
        let delay = Duration::from_millis(200);
        let spies: Vec<_> = [AgentName::Reviewer, AgentName::Optimizer, AgentName::Editor]
            .into_iter()
            .map(|name| Arc::new(SpyAgent::new(name).with_delay(delay)))
            .collect();
        let executor = WorkflowExecutor::new(Arc::new(registry_with(&spies)));

        let definition = WorkflowDefinition::new(
            "fan_out",
            "three slow branches",
            StepType::Parallel,
            spies
                .iter()
                .map(|spy| WorkflowStep::new(spy.agent_name(), "task"))
                .collect(),
        );

        let start = Instant::now();
        let result = executor
            .execute(&definition, JsonMap::new(), &CancellationToken::new())
            .await;

        assert!(result.success);
        assert_eq!(result.steps_completed, 3);
        assert!(start.elapsed() < delay * 3);
    }

    #[tokio::test]
    async fn test_parallel_template_failure_becomes_error_response() {
        let reviewer = Arc::new(SpyAgent::new(AgentName::Reviewer));
        let executor = WorkflowExecutor::new(Arc::new(registry_with(&[reviewer.clone()])));

        let definition = WorkflowDefinition::new(
            "fan_out",
            "bad template",
            StepType::Parallel,
            vec![WorkflowStep::new(AgentName::Reviewer, "content_review")
                .with_template(json!({"content": "{{input.missing}}"}))],
        );

        let result = executor
            .execute(&definition, JsonMap::new(), &CancellationToken::new())
            .await;

        assert!(!result.success);
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].target_agent, EXECUTOR_SOURCE);
        assert_eq!(reviewer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_run_stops_before_first_step() {
        let strategist = Arc::new(SpyAgent::new(AgentName::Strategist));
        let executor = WorkflowExecutor::new(Arc::new(registry_with(&[strategist.clone()])));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = executor
            .execute(&three_step(StepType::Sequential), JsonMap::new(), &cancel)
            .await;

        assert!(!result.success);
        assert_eq!(result.steps_completed, 0);
        assert!(result.errors[0].ends_with("cancelled"));
        assert_eq!(strategist.call_count(), 0);
    }

    #[test]
    fn test_merge_later_layers_win() {
        let merged = merge(&[
            &map(json!({"a": 1, "b": 1})),
            &map(json!({"b": 2, "c": 2})),
            &map(json!({"c": 3})),
        ]);
        assert_eq!(merged, map(json!({"a": 1, "b": 2, "c": 3})));
    }
}
