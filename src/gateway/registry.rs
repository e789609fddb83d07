//! Provider construction from configuration
//!
//! The mock/live decision is made here, once. Mock mode registers the offline
//! provider under every known vendor name; live mode builds one client per
//! `[providers.<name>]` section and remembers why any section could not be
//! built.

use crate::config::{GatewayMode, OrchestratorConfig, ProviderSection, KNOWN_PROVIDERS};
use crate::llm::provider::{LlmError, LlmProvider};
use crate::llm::providers::{
    AnthropicConfig, AnthropicProvider, GoogleConfig, GoogleProvider, MockProvider, OllamaConfig,
    OllamaProvider, OpenAiConfig, OpenAiProvider,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

pub type ProviderMap = BTreeMap<String, Arc<dyn LlmProvider>>;

/// Configured providers split into usable clients and failed sections
#[derive(Default)]
pub struct ProviderSet {
    pub providers: ProviderMap,
    /// Sections that could not be built, with the reason
    pub unavailable: BTreeMap<String, LlmError>,
}

/// Build every configured provider for the configured mode
///
/// Live sections that cannot be built (missing key, bad client settings) are
/// kept in [`ProviderSet::unavailable`]; calls routed to them fail as not
/// configured and health checks report them as unhealthy.
pub fn build_providers(config: &OrchestratorConfig) -> ProviderSet {
    match config.gateway.mode {
        GatewayMode::Mock => ProviderSet {
            providers: mock_providers(),
            unavailable: BTreeMap::new(),
        },
        GatewayMode::Live => {
            let mut set = ProviderSet::default();
            for (name, section) in &config.providers {
                match build_live_provider(name, section) {
                    Ok(provider) => {
                        info!(provider = %name, "Provider configured");
                        set.providers.insert(name.clone(), provider);
                    }
                    Err(e) => {
                        warn!(provider = %name, error = %e, "Provider unavailable");
                        set.unavailable.insert(name.clone(), e);
                    }
                }
            }
            set
        }
    }
}

/// Offline provider registered under every vendor name
pub fn mock_providers() -> ProviderMap {
    KNOWN_PROVIDERS
        .iter()
        .map(|name| {
            let provider: Arc<dyn LlmProvider> = Arc::new(MockProvider::new(*name));
            (name.to_string(), provider)
        })
        .collect()
}

fn required_key(name: &str, section: &ProviderSection) -> Result<String, LlmError> {
    section
        .api_key()
        .map_err(|e| LlmError::NotConfigured(e.to_string()))?
        .filter(|key| !key.is_empty())
        .ok_or_else(|| LlmError::NotConfigured(format!("{name} requires api_key_env")))
}

fn build_live_provider(
    name: &str,
    section: &ProviderSection,
) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let timeout = section.timeout();

    let provider: Arc<dyn LlmProvider> = match name {
        "openai" => {
            let mut config = OpenAiConfig {
                api_key: required_key(name, section)?,
                timeout,
                ..Default::default()
            };
            if let Some(url) = &section.base_url {
                config.base_url = url.clone();
            }
            Arc::new(OpenAiProvider::new(config)?)
        }
        "anthropic" => {
            let mut config = AnthropicConfig {
                api_key: required_key(name, section)?,
                timeout,
                ..Default::default()
            };
            if let Some(url) = &section.base_url {
                config.base_url = url.clone();
            }
            Arc::new(AnthropicProvider::new(config)?)
        }
        "google" => {
            let mut config = GoogleConfig {
                api_key: required_key(name, section)?,
                timeout,
                ..Default::default()
            };
            if let Some(url) = &section.base_url {
                config.base_url = url.clone();
            }
            Arc::new(GoogleProvider::new(config)?)
        }
        "ollama" => {
            let mut config = OllamaConfig {
                timeout,
                ..Default::default()
            };
            if let Some(url) = &section.base_url {
                config.base_url = url.clone();
            }
            Arc::new(OllamaProvider::new(config)?)
        }
        other => {
            return Err(LlmError::NotConfigured(format!(
                "no client implementation for provider '{other}'"
            )))
        }
    };

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_mode_registers_every_vendor() {
        let set = build_providers(&OrchestratorConfig::with_defaults());

        assert_eq!(set.providers.len(), KNOWN_PROVIDERS.len());
        assert!(set.unavailable.is_empty());
        for name in KNOWN_PROVIDERS {
            assert_eq!(set.providers[name].name(), name);
            assert_eq!(set.providers[name].vendor(), "mock");
        }
    }

    #[test]
    fn test_live_mode_keeps_reason_for_providers_without_keys() {
        let mut config = OrchestratorConfig::with_defaults();
        config.gateway.mode = GatewayMode::Live;
        for section in config.providers.values_mut() {
            if section.api_key_env.is_some() {
                section.api_key_env = Some("A2A_TEST_KEY_THAT_IS_NEVER_SET".to_string());
            }
        }

        let set = build_providers(&config);
        assert_eq!(set.providers.keys().collect::<Vec<_>>(), vec!["ollama"]);
        assert_eq!(set.providers["ollama"].vendor(), "ollama");
        assert_eq!(
            set.unavailable.keys().collect::<Vec<_>>(),
            vec!["anthropic", "google", "openai"]
        );
        assert!(set
            .unavailable
            .values()
            .all(|e| matches!(e, LlmError::NotConfigured(_))));
    }
}
