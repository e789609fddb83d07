//! Intent → agent lookup
//!
//! A static table maps each classified intent to the agent that owns it.
//! Intents absent from the table, including `unknown`, go to the planner.

use super::intent::Intent;
use crate::agent::catalog::AgentName;

/// Intent ownership table
pub static INTENT_AGENT_TABLE: &[(Intent, AgentName)] = &[
    (Intent::Copywriting, AgentName::Copywriter),
    (Intent::Strategy, AgentName::Strategist),
    (Intent::Design, AgentName::Designer),
    (Intent::Review, AgentName::Reviewer),
    (Intent::Optimization, AgentName::Optimizer),
    (Intent::Editing, AgentName::Editor),
    (Intent::Video, AgentName::ScenePlanner),
    (Intent::BrandAnalysis, AgentName::BrandAnalyzer),
    (Intent::ComplexWorkflow, AgentName::Pm),
];

/// Static intent → agent selector
#[derive(Debug, Clone, Copy)]
pub struct AgentSelector {
    table: &'static [(Intent, AgentName)],
    fallback: AgentName,
}

impl Default for AgentSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentSelector {
    pub fn new() -> Self {
        Self {
            table: INTENT_AGENT_TABLE,
            fallback: AgentName::FALLBACK,
        }
    }

    pub fn select(&self, intent: Intent) -> AgentName {
        self.table
            .iter()
            .find(|(i, _)| *i == intent)
            .map(|(_, agent)| *agent)
            .unwrap_or(self.fallback)
    }
}
