//! Request routing
//!
//! The SmartRouter composes five table-driven deciders:
//!
//! - [`intent`]: ordered keyword rules, first match wins
//! - [`risk`]: ordered risk heuristics
//! - [`agent_selector`]: intent to agent lookup with a planner fallback
//! - [`model_selector`]: forced model, risk and context size gate the tier
//! - [`context`]: trims the context to the agent's declared fields

pub mod agent_selector;
pub mod context;
pub mod intent;
pub mod model_selector;
pub mod risk;
pub mod router;

pub use agent_selector::{AgentSelector, INTENT_AGENT_TABLE};
pub use context::{serialized_size, summarize_brandkit, ContextMinimizer, BRANDKIT_SUMMARY_KEY};
pub use intent::{Intent, IntentClassification, IntentClassifier, INTENT_RULES};
pub use model_selector::{ModelChoice, ModelSelection, ModelSelector};
pub use risk::{RiskAssessment, RiskAssessor, RiskLevel, RiskRule};
pub use router::{RouteDecision, RouteRequest, RoutingMetadata, SmartRouter};
