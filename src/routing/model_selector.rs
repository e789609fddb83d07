//! Backend model selection
//!
//! Precedence: an explicit `force_model` wins outright; high risk always gets
//! the top-quality model; an oversized context also gets the top-quality
//! model; otherwise the agent's default tier decides.

use super::risk::RiskLevel;
use crate::agent::catalog::AgentName;
use crate::config::{ModelTiers, RouterSection};

/// Why a model was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChoice {
    Forced,
    HighRisk,
    LargeContext,
    AgentDefault,
}

/// Selected model identifier plus the rule that chose it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: String,
    pub choice: ModelChoice,
}

#[derive(Debug, Clone)]
pub struct ModelSelector {
    tiers: ModelTiers,
    context_size_threshold_bytes: usize,
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self::new(ModelTiers::default(), &RouterSection::default())
    }
}

impl ModelSelector {
    pub fn new(tiers: ModelTiers, router: &RouterSection) -> Self {
        Self {
            tiers,
            context_size_threshold_bytes: router.context_size_threshold_bytes,
        }
    }

    pub fn top_quality(&self) -> &str {
        self.tiers.top_quality()
    }

    pub fn select(
        &self,
        agent: AgentName,
        risk: RiskLevel,
        context_size_bytes: usize,
        force_model: Option<&str>,
    ) -> ModelSelection {
        if let Some(model) = force_model {
            return ModelSelection {
                model: model.to_string(),
                choice: ModelChoice::Forced,
            };
        }

        if risk == RiskLevel::High {
            return ModelSelection {
                model: self.tiers.top_quality().to_string(),
                choice: ModelChoice::HighRisk,
            };
        }

        if context_size_bytes > self.context_size_threshold_bytes {
            return ModelSelection {
                model: self.tiers.top_quality().to_string(),
                choice: ModelChoice::LargeContext,
            };
        }

        ModelSelection {
            model: self.tiers.model_for(agent.default_tier()).to_string(),
            choice: ModelChoice::AgentDefault,
        }
    }
}
