//! Closed catalog of marketing agents
//!
//! Every routable worker is one of the [`AgentName`] variants. The catalog
//! profile of each agent declares its default model tier and the context
//! fields it needs, which drives model selection and context minimization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cost/quality class of backend model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Fast,
    Balanced,
    Quality,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Fast => "fast",
            ModelTier::Balanced => "balanced",
            ModelTier::Quality => "quality",
        }
    }
}

/// Identity of an agent in the closed agent set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentName {
    Copywriter,
    Strategist,
    Designer,
    Reviewer,
    Optimizer,
    Editor,
    ScenePlanner,
    BrandAnalyzer,
    VisionAnalyzer,
    Pm,
}

/// Static per-agent profile
#[derive(Debug, Clone, Copy)]
pub struct AgentProfile {
    pub name: AgentName,
    pub version: &'static str,
    pub description: &'static str,
    pub default_tier: ModelTier,
    pub required_fields: &'static [&'static str],
}

impl AgentName {
    /// Every agent in catalog order
    pub const ALL: [AgentName; 10] = [
        AgentName::Copywriter,
        AgentName::Strategist,
        AgentName::Designer,
        AgentName::Reviewer,
        AgentName::Optimizer,
        AgentName::Editor,
        AgentName::ScenePlanner,
        AgentName::BrandAnalyzer,
        AgentName::VisionAnalyzer,
        AgentName::Pm,
    ];

    /// Planner agent that receives unclassified requests
    pub const FALLBACK: AgentName = AgentName::Pm;

    /// Agent that receives the caller's context unchanged
    pub const FULL_CONTEXT: AgentName = AgentName::Pm;

    /// Agent that works on the full brand kit rather than its summary
    pub const BRAND_SPECIFIC: AgentName = AgentName::BrandAnalyzer;

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentName::Copywriter => "copywriter",
            AgentName::Strategist => "strategist",
            AgentName::Designer => "designer",
            AgentName::Reviewer => "reviewer",
            AgentName::Optimizer => "optimizer",
            AgentName::Editor => "editor",
            AgentName::ScenePlanner => "scene_planner",
            AgentName::BrandAnalyzer => "brand_analyzer",
            AgentName::VisionAnalyzer => "vision_analyzer",
            AgentName::Pm => "pm",
        }
    }

    pub fn profile(&self) -> AgentProfile {
        match self {
            AgentName::Copywriter => AgentProfile {
                name: *self,
                version: "1.2.0",
                description: "Writes headlines, body copy and calls to action",
                default_tier: ModelTier::Fast,
                required_fields: &[
                    "product_name",
                    "features",
                    "target_audience",
                    "tone",
                    "brand_name",
                    "channel",
                ],
            },
            AgentName::Strategist => AgentProfile {
                name: *self,
                version: "1.1.0",
                description: "Plans campaigns, positioning and channel mix",
                default_tier: ModelTier::Balanced,
                required_fields: &[
                    "brand_name",
                    "target_audience",
                    "budget",
                    "goals",
                    "market",
                    "competitors",
                    "channel",
                ],
            },
            AgentName::Designer => AgentProfile {
                name: *self,
                version: "1.0.0",
                description: "Produces visual concepts and image prompts",
                default_tier: ModelTier::Balanced,
                required_fields: &["product_name", "style", "dimensions", "brand_name", "channel"],
            },
            AgentName::Reviewer => AgentProfile {
                name: *self,
                version: "1.0.0",
                description: "Scores content against brand and quality criteria",
                default_tier: ModelTier::Balanced,
                required_fields: &["content", "criteria", "brand_name"],
            },
            AgentName::Optimizer => AgentProfile {
                name: *self,
                version: "1.0.0",
                description: "Suggests performance improvements for existing content",
                default_tier: ModelTier::Balanced,
                required_fields: &["content", "metrics", "goals", "channel"],
            },
            AgentName::Editor => AgentProfile {
                name: *self,
                version: "1.0.0",
                description: "Proofreads and rewrites content to a target tone and length",
                default_tier: ModelTier::Fast,
                required_fields: &["content", "tone", "length", "instructions"],
            },
            AgentName::ScenePlanner => AgentProfile {
                name: *self,
                version: "0.9.0",
                description: "Breaks a video concept into a scene-by-scene storyboard",
                default_tier: ModelTier::Balanced,
                required_fields: &["product_name", "duration", "style", "target_audience"],
            },
            AgentName::BrandAnalyzer => AgentProfile {
                name: *self,
                version: "1.0.0",
                description: "Analyzes brand assets and extracts identity guidelines",
                default_tier: ModelTier::Balanced,
                required_fields: &["brand_name", "brandkit", "website", "industry"],
            },
            AgentName::VisionAnalyzer => AgentProfile {
                name: *self,
                version: "0.9.0",
                description: "Evaluates images against composition and brand criteria",
                default_tier: ModelTier::Balanced,
                required_fields: &["image_url", "criteria"],
            },
            AgentName::Pm => AgentProfile {
                name: *self,
                version: "1.0.0",
                description: "Plans multi-agent work for requests no specialist claims",
                default_tier: ModelTier::Balanced,
                required_fields: &[],
            },
        }
    }

    pub fn required_fields(&self) -> &'static [&'static str] {
        self.profile().required_fields
    }

    pub fn default_tier(&self) -> ModelTier {
        self.profile().default_tier
    }

    pub fn version(&self) -> &'static str {
        self.profile().version
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name outside the closed agent set
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown agent '{0}'")]
pub struct UnknownAgent(pub String);

impl FromStr for AgentName {
    type Err = UnknownAgent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        AgentName::ALL
            .into_iter()
            .find(|agent| agent.as_str() == normalized)
            .ok_or_else(|| UnknownAgent(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for agent in AgentName::ALL {
            assert_eq!(agent.as_str().parse::<AgentName>().unwrap(), agent);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive_and_accepts_dashes() {
        assert_eq!(
            "Scene-Planner".parse::<AgentName>().unwrap(),
            AgentName::ScenePlanner
        );
        assert_eq!(" PM ".parse::<AgentName>().unwrap(), AgentName::Pm);
    }

    #[test]
    fn test_unknown_agent_rejected() {
        let err = "translator".parse::<AgentName>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown agent 'translator'");
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&AgentName::BrandAnalyzer).unwrap();
        assert_eq!(json, "\"brand_analyzer\"");
    }

    #[test]
    fn test_full_context_agent_declares_no_fields() {
        assert!(AgentName::FULL_CONTEXT.required_fields().is_empty());
        assert!(AgentName::BRAND_SPECIFIC
            .required_fields()
            .contains(&"brandkit"));
    }

    #[test]
    fn test_only_brand_agent_requires_brandkit() {
        for agent in AgentName::ALL {
            if agent != AgentName::BRAND_SPECIFIC {
                assert!(
                    !agent.required_fields().contains(&"brandkit"),
                    "{agent} should receive brandkit_summary instead"
                );
            }
        }
    }
}
