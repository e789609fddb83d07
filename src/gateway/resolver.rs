//! Model and provider resolution
//!
//! Two static tables drive every decision:
//!
//! - [`PROVIDER_PATTERNS`] maps a model name to the provider serving it
//! - [`TASK_TIER_OVERRIDES`] raises or lowers the tier for specific
//!   (role, task) pairs on top of each role's catalog default
//!
//! Names that match no pattern go to the configured default provider.

use crate::agent::catalog::{AgentName, ModelTier};
use crate::config::ModelTiers;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a pattern is tested against a lowercased model name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternMatch {
    Prefix,
    Contains,
}

/// Ordered (pattern, match kind, provider) table. First hit wins.
///
/// Short family names are prefix-only so they cannot fire inside unrelated
/// names (`phi` inside `dolphin`).
pub static PROVIDER_PATTERNS: &[(&str, PatternMatch, &str)] = &[
    ("claude", PatternMatch::Contains, "anthropic"),
    ("gemini", PatternMatch::Contains, "google"),
    ("gpt", PatternMatch::Contains, "openai"),
    ("o1", PatternMatch::Prefix, "openai"),
    ("o3", PatternMatch::Prefix, "openai"),
    ("qwen", PatternMatch::Contains, "ollama"),
    ("llama", PatternMatch::Contains, "ollama"),
    ("mistral", PatternMatch::Contains, "ollama"),
    ("mixtral", PatternMatch::Contains, "ollama"),
    ("gemma", PatternMatch::Contains, "ollama"),
    ("phi", PatternMatch::Prefix, "ollama"),
];

/// (role, task, tier) overrides applied before the role default
pub static TASK_TIER_OVERRIDES: &[(&str, &str, ModelTier)] = &[
    ("brand_analyzer", "brand_analysis", ModelTier::Quality),
    ("strategist", "brand_strategy", ModelTier::Quality),
    ("scene_planner", "storyboard", ModelTier::Quality),
    ("reviewer", "final_review", ModelTier::Quality),
    ("copywriter", "channel_copy", ModelTier::Fast),
];

/// Concrete target of one generate call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub provider: String,
    pub model: String,
    /// Tier used, absent when the caller named the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<ModelTier>,
}

#[derive(Debug, Clone)]
pub struct ProviderResolver {
    default_provider: String,
    tiers: ModelTiers,
}

impl ProviderResolver {
    pub fn new<S: Into<String>>(default_provider: S, tiers: ModelTiers) -> Self {
        Self {
            default_provider: default_provider.into(),
            tiers,
        }
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    /// Provider for a model name; never fails
    pub fn provider_for_model<'a>(&'a self, model: &str) -> &'a str {
        let normalized = model.trim().to_lowercase();
        // Strip namespaces such as "library/qwen2.5:7b"
        let name = normalized.rsplit('/').next().unwrap_or(&normalized);

        PROVIDER_PATTERNS
            .iter()
            .find(|(pattern, kind, _)| match kind {
                PatternMatch::Prefix => name.starts_with(pattern),
                PatternMatch::Contains => name.contains(pattern),
            })
            .map(|(_, _, provider)| *provider)
            .unwrap_or(&self.default_provider)
    }

    /// Tier for a role, honouring task overrides
    ///
    /// Roles outside the agent catalog get the balanced tier.
    pub fn tier_for(&self, role: &str, task: &str) -> ModelTier {
        let role = role.trim().to_lowercase();
        let task = task.trim().to_lowercase();

        TASK_TIER_OVERRIDES
            .iter()
            .find(|(r, t, _)| *r == role && *t == task)
            .map(|(_, _, tier)| *tier)
            .or_else(|| AgentName::from_str(&role).ok().map(|a| a.default_tier()))
            .unwrap_or(ModelTier::Balanced)
    }

    pub fn resolve(&self, role: &str, task: &str, override_model: Option<&str>) -> Resolution {
        match override_model.map(str::trim).filter(|m| !m.is_empty()) {
            Some(model) => Resolution {
                provider: self.provider_for_model(model).to_string(),
                model: model.to_string(),
                tier: None,
            },
            None => {
                let tier = self.tier_for(role, task);
                let model = self.tiers.model_for(tier);
                Resolution {
                    provider: self.provider_for_model(model).to_string(),
                    model: model.to_string(),
                    tier: Some(tier),
                }
            }
        }
    }
}

impl Default for ProviderResolver {
    fn default() -> Self {
        Self::new("ollama", ModelTiers::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_resolutions() {
        let resolver = ProviderResolver::default();
        assert_eq!(resolver.provider_for_model("GPT-4O"), "openai");
        assert_eq!(resolver.provider_for_model("qwen2.5:7b"), "ollama");
        assert_eq!(resolver.provider_for_model("totally-unknown-model"), "ollama");
    }

    #[test]
    fn test_vendor_families() {
        let resolver = ProviderResolver::default();
        assert_eq!(resolver.provider_for_model("claude-3-5-sonnet-20241022"), "anthropic");
        assert_eq!(resolver.provider_for_model("gemini-1.5-pro"), "google");
        assert_eq!(resolver.provider_for_model("o1-mini"), "openai");
        assert_eq!(resolver.provider_for_model("chatgpt-4o-latest"), "openai");
        assert_eq!(resolver.provider_for_model("Mixtral-8x7B"), "ollama");
        assert_eq!(resolver.provider_for_model("llama3.1:8b"), "ollama");
        assert_eq!(resolver.provider_for_model("library/gemma2:9b"), "ollama");
        assert_eq!(resolver.provider_for_model("phi3:mini"), "ollama");
    }

    #[test]
    fn test_short_patterns_are_prefix_only() {
        let resolver = ProviderResolver::new("openai", ModelTiers::default());
        // "dolphin" contains "phi" but must fall through to the default
        assert_eq!(resolver.provider_for_model("dolphin-2.9"), "openai");
        assert_eq!(resolver.provider_for_model("pro1-model"), "openai");
    }

    #[test]
    fn test_unknown_model_uses_configured_default() {
        let resolver = ProviderResolver::new("anthropic", ModelTiers::default());
        assert_eq!(resolver.provider_for_model("mystery-7b"), "anthropic");
        assert_eq!(resolver.provider_for_model(""), "anthropic");
    }

    #[test]
    fn test_tier_from_role_and_task() {
        let resolver = ProviderResolver::default();
        assert_eq!(resolver.tier_for("copywriter", "product_copy"), ModelTier::Fast);
        assert_eq!(resolver.tier_for("strategist", "product_strategy"), ModelTier::Balanced);
        assert_eq!(resolver.tier_for("strategist", "brand_strategy"), ModelTier::Quality);
        assert_eq!(resolver.tier_for("Reviewer", "FINAL_REVIEW"), ModelTier::Quality);
        assert_eq!(resolver.tier_for("freelancer", "anything"), ModelTier::Balanced);
    }

    #[test]
    fn test_resolve_without_override() {
        let resolution = ProviderResolver::default().resolve("copywriter", "product_copy", None);
        assert_eq!(resolution.model, "qwen2.5:7b");
        assert_eq!(resolution.provider, "ollama");
        assert_eq!(resolution.tier, Some(ModelTier::Fast));

        let resolution = ProviderResolver::default().resolve("brand_analyzer", "brand_analysis", None);
        assert_eq!(resolution.model, "gpt-4o");
        assert_eq!(resolution.provider, "openai");
    }

    #[test]
    fn test_resolve_with_override() {
        let resolution = ProviderResolver::default().resolve(
            "copywriter",
            "product_copy",
            Some("claude-3-5-haiku-20241022"),
        );
        assert_eq!(resolution.provider, "anthropic");
        assert_eq!(resolution.model, "claude-3-5-haiku-20241022");
        assert_eq!(resolution.tier, None);
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let resolution = ProviderResolver::default().resolve("editor", "content_edit", Some("  "));
        assert_eq!(resolution.tier, Some(ModelTier::Fast));
    }
}
