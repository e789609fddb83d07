//! SmartRouter - composes intent, risk, agent, model and context deciders
//!
//! `route()` is a pure function of the request and the static tables loaded
//! at construction: no randomness, no hidden mutable state. Two calls with the
//! same request produce the same decision.
//!
//! # Example
//!
//! ```rust
//! use a2a_orchestrator::routing::{RouteRequest, SmartRouter};
//! use a2a_orchestrator::agent::catalog::AgentName;
//!
//! let router = SmartRouter::with_defaults();
//! let decision = router.route(&RouteRequest::new("user-1", "카피 작성해줘"));
//!
//! assert_eq!(decision.target_agent, AgentName::Copywriter);
//! assert_eq!(decision.routing_metadata.intent, "copywriting");
//! ```

use super::agent_selector::AgentSelector;
use super::context::{serialized_size, ContextMinimizer};
use super::intent::IntentClassifier;
use super::model_selector::ModelSelector;
use super::risk::{RiskAssessor, RiskLevel};
use crate::agent::catalog::AgentName;
use crate::config::OrchestratorConfig;
use crate::observability::sink::{DecisionLogSink, RoutingRecord, TracingDecisionLog};
use crate::route_span;
use crate::JsonMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Free-text request to be routed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub user_id: String,
    pub request_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub context: JsonMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_model: Option<String>,
}

impl RouteRequest {
    pub fn new<U: Into<String>, T: Into<String>>(user_id: U, request_text: T) -> Self {
        Self {
            user_id: user_id.into(),
            request_text: request_text.into(),
            brand_id: None,
            project_id: None,
            context: JsonMap::new(),
            force_model: None,
        }
    }

    pub fn with_context(mut self, context: JsonMap) -> Self {
        self.context = context;
        self
    }

    pub fn with_force_model<S: Into<String>>(mut self, model: S) -> Self {
        self.force_model = Some(model.into());
        self
    }
}

/// How the decision was reached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingMetadata {
    pub intent: String,
    pub confidence: f64,
    pub reasoning: String,
}

/// Output of one `route()` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDecision {
    pub target_agent: AgentName,
    pub selected_model: String,
    pub risk_level: RiskLevel,
    pub minimized_context: JsonMap,
    pub routing_metadata: RoutingMetadata,
}

pub struct SmartRouter {
    intents: IntentClassifier,
    risk: RiskAssessor,
    agents: AgentSelector,
    models: ModelSelector,
    minimizer: ContextMinimizer,
    sink: Arc<dyn DecisionLogSink>,
}

impl SmartRouter {
    pub fn new(config: &OrchestratorConfig, sink: Arc<dyn DecisionLogSink>) -> Self {
        Self {
            intents: IntentClassifier::new(),
            risk: RiskAssessor::new(&config.router),
            agents: AgentSelector::new(),
            models: ModelSelector::new(config.models.clone(), &config.router),
            minimizer: ContextMinimizer::new(),
            sink,
        }
    }

    /// Router over default tables, logging decisions through `tracing`
    pub fn with_defaults() -> Self {
        Self::new(
            &OrchestratorConfig::with_defaults(),
            Arc::new(TracingDecisionLog),
        )
    }

    /// The model high-risk requests are pinned to
    pub fn top_quality_model(&self) -> &str {
        self.models.top_quality()
    }

    pub fn route(&self, request: &RouteRequest) -> RouteDecision {
        let span = route_span!(user_id = %request.user_id);
        let _guard = span.enter();

        let classification = self.intents.classify(&request.request_text);
        let risk = self
            .risk
            .assess(&request.request_text, &request.context, classification.intent);
        let target_agent = self.agents.select(classification.intent);
        let context_size = serialized_size(&request.context);
        let selection = self.models.select(
            target_agent,
            risk.level,
            context_size,
            request.force_model.as_deref(),
        );
        let minimized_context = self.minimizer.minimize(target_agent, &request.context);

        debug!(
            intent = %classification.intent,
            risk_level = %risk.level,
            risk_rule = ?risk.rule,
            agent = %target_agent,
            model = %selection.model,
            model_choice = ?selection.choice,
            context_size_bytes = context_size,
            minimized_keys = minimized_context.len(),
            "Routing decision made"
        );

        let decision = RouteDecision {
            target_agent,
            selected_model: selection.model,
            risk_level: risk.level,
            minimized_context,
            routing_metadata: RoutingMetadata {
                intent: classification.intent.as_str().to_string(),
                confidence: classification.confidence,
                reasoning: classification.reasoning,
            },
        };

        self.sink.record_routing(&RoutingRecord {
            request_text: request.request_text.clone(),
            detected_intent: decision.routing_metadata.intent.clone(),
            selected_agent: decision.target_agent.as_str().to_string(),
            selected_model: decision.selected_model.clone(),
            risk_level: decision.risk_level,
            decision_metadata: decision.routing_metadata.clone(),
        });

        decision
    }
}
