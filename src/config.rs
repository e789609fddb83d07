//! Orchestrator configuration
//!
//! Static tables that tune routing thresholds, model tiers and provider
//! endpoints. Loaded once from TOML at process start and treated as immutable
//! for the process lifetime. Every section has defaults, so an empty file is a
//! valid configuration.

use crate::agent::catalog::ModelTier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides `[gateway].mode`
pub const GATEWAY_MODE_ENV: &str = "GATEWAY_MODE";

/// Provider names the gateway knows how to construct
pub const KNOWN_PROVIDERS: [&str; 4] = ["openai", "anthropic", "google", "ollama"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub gateway: GatewaySection,
    #[serde(default = "default_providers")]
    pub providers: BTreeMap<String, ProviderSection>,
    #[serde(default)]
    pub models: ModelTiers,
    #[serde(default)]
    pub router: RouterSection,
    #[serde(default)]
    pub workflow: WorkflowSection,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Gateway operating mode, chosen once at construction time
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatewayMode {
    /// Deterministic in-process provider under every vendor name
    #[default]
    Mock,
    /// Real HTTP providers
    Live,
}

impl GatewayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayMode::Mock => "mock",
            GatewayMode::Live => "live",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Some(GatewayMode::Mock),
            "live" => Some(GatewayMode::Live),
            _ => None,
        }
    }
}

/// Gateway section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewaySection {
    #[serde(default)]
    pub mode: GatewayMode,
    /// Provider used when a model name matches no lookup rule
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Per-provider probe budget for health checks
    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            mode: GatewayMode::default(),
            default_provider: default_provider(),
            health_timeout_ms: default_health_timeout_ms(),
        }
    }
}

impl GatewaySection {
    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }
}

/// Per-provider connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderSection {
    /// Environment variable containing the API key (absent for keyless providers)
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<Option<String>, ConfigError> {
        match &self.api_key_env {
            Some(name) => std::env::var(name)
                .map(Some)
                .map_err(|_| ConfigError::EnvVarNotFound(name.clone())),
            None => Ok(None),
        }
    }
}

/// Concrete model identifier per cost/quality tier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelTiers {
    #[serde(default = "default_fast_model")]
    pub fast: String,
    #[serde(default = "default_balanced_model")]
    pub balanced: String,
    #[serde(default = "default_quality_model")]
    pub quality: String,
}

impl Default for ModelTiers {
    fn default() -> Self {
        Self {
            fast: default_fast_model(),
            balanced: default_balanced_model(),
            quality: default_quality_model(),
        }
    }
}

impl ModelTiers {
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast,
            ModelTier::Balanced => &self.balanced,
            ModelTier::Quality => &self.quality,
        }
    }

    /// The top-quality model used for high-risk and oversized requests
    pub fn top_quality(&self) -> &str {
        &self.quality
    }
}

/// SmartRouter thresholds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouterSection {
    /// `context.budget` above this value makes a request high-risk
    #[serde(default = "default_budget_threshold")]
    pub budget_threshold: f64,
    /// Serialized context larger than this forces the top-quality model
    #[serde(default = "default_context_size_threshold_bytes")]
    pub context_size_threshold_bytes: usize,
    /// Counted quantities at or above this value make a request high-risk
    #[serde(default = "default_large_quantity_threshold")]
    pub large_quantity_threshold: u64,
}

impl Default for RouterSection {
    fn default() -> Self {
        Self {
            budget_threshold: default_budget_threshold(),
            context_size_threshold_bytes: default_context_size_threshold_bytes(),
            large_quantity_threshold: default_large_quantity_threshold(),
        }
    }
}

/// Workflow execution settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowSection {
    /// Deadline for a single step; 0 disables the deadline
    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,
}

impl Default for WorkflowSection {
    fn default() -> Self {
        Self {
            step_timeout_secs: default_step_timeout_secs(),
        }
    }
}

impl WorkflowSection {
    pub fn step_timeout(&self) -> Option<Duration> {
        (self.step_timeout_secs > 0).then(|| Duration::from_secs(self.step_timeout_secs))
    }
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_health_timeout_ms() -> u64 {
    3000
}

fn default_provider_timeout_secs() -> u64 {
    60
}

fn default_fast_model() -> String {
    "qwen2.5:7b".to_string()
}

fn default_balanced_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_quality_model() -> String {
    "gpt-4o".to_string()
}

fn default_budget_threshold() -> f64 {
    1_000_000.0
}

fn default_context_size_threshold_bytes() -> usize {
    8_000
}

fn default_large_quantity_threshold() -> u64 {
    10
}

fn default_step_timeout_secs() -> u64 {
    120
}

fn default_providers() -> BTreeMap<String, ProviderSection> {
    let mut providers = BTreeMap::new();
    providers.insert(
        "openai".to_string(),
        ProviderSection {
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            base_url: None,
            timeout_secs: default_provider_timeout_secs(),
        },
    );
    providers.insert(
        "anthropic".to_string(),
        ProviderSection {
            api_key_env: Some("ANTHROPIC_API_KEY".to_string()),
            base_url: None,
            timeout_secs: default_provider_timeout_secs(),
        },
    );
    providers.insert(
        "google".to_string(),
        ProviderSection {
            api_key_env: Some("GOOGLE_API_KEY".to_string()),
            base_url: None,
            timeout_secs: default_provider_timeout_secs(),
        },
    );
    providers.insert(
        "ollama".to_string(),
        ProviderSection {
            api_key_env: None,
            base_url: Some("http://localhost:11434".to_string()),
            timeout_secs: 120,
        },
    );
    providers
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl OrchestratorConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text, then apply environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: OrchestratorConfig = toml::from_str(content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(mode) = std::env::var(GATEWAY_MODE_ENV) {
            self.gateway.mode = GatewayMode::parse(&mode).ok_or_else(|| {
                ConfigError::InvalidConfig(format!(
                    "{GATEWAY_MODE_ENV} must be 'mock' or 'live', got '{mode}'"
                ))
            })?;
        }
        Ok(())
    }

    /// Validate value ranges and cross-section consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !KNOWN_PROVIDERS.contains(&self.gateway.default_provider.as_str()) {
            return Err(ConfigError::InvalidConfig(format!(
                "Unknown default provider '{}', expected one of {:?}",
                self.gateway.default_provider, KNOWN_PROVIDERS
            )));
        }

        if let Some(name) = self
            .providers
            .keys()
            .find(|name| !KNOWN_PROVIDERS.contains(&name.as_str()))
        {
            return Err(ConfigError::InvalidConfig(format!(
                "Unknown provider section [providers.{name}]"
            )));
        }

        for (tier, model) in [
            ("fast", &self.models.fast),
            ("balanced", &self.models.balanced),
            ("quality", &self.models.quality),
        ] {
            if model.trim().is_empty() {
                return Err(ConfigError::InvalidConfig(format!(
                    "Model for tier '{tier}' must not be empty"
                )));
            }
        }

        if self.router.budget_threshold <= 0.0 {
            return Err(ConfigError::InvalidConfig(
                "router.budget_threshold must be positive".to_string(),
            ));
        }
        if self.router.context_size_threshold_bytes == 0 {
            return Err(ConfigError::InvalidConfig(
                "router.context_size_threshold_bytes must be positive".to_string(),
            ));
        }
        if self.router.large_quantity_threshold == 0 {
            return Err(ConfigError::InvalidConfig(
                "router.large_quantity_threshold must be positive".to_string(),
            ));
        }
        if self.gateway.health_timeout_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "gateway.health_timeout_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Configuration with every section at its default
    pub fn with_defaults() -> Self {
        Self {
            gateway: GatewaySection::default(),
            providers: default_providers(),
            models: ModelTiers::default(),
            router: RouterSection::default(),
            workflow: WorkflowSection::default(),
        }
    }
}
