//! Provider health checks
//!
//! One bounded probe per provider, run concurrently. Probing never fails: an
//! unreachable or misconfigured provider shows up as a status in the report.

use crate::llm::provider::{LlmError, LlmProvider};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Health of one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Probe succeeded
    Healthy,
    /// Provider answered but refused the call (auth, 4xx, not configured)
    Unhealthy,
    /// Provider answered with a server-side or unexpected failure
    Error,
    /// Provider could not be reached within the probe timeout
    Offline,
}

impl HealthStatus {
    /// Classify a failed probe
    pub fn from_error(err: &LlmError) -> Self {
        match err {
            _ if err.is_unreachable() => HealthStatus::Offline,
            LlmError::AuthenticationFailed(_)
            | LlmError::NotConfigured(_)
            | LlmError::ModelNotFound(_)
            | LlmError::ClientError { .. }
            | LlmError::InvalidRequest(_) => HealthStatus::Unhealthy,
            _ => HealthStatus::Error,
        }
    }
}

/// Probe result for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub status: HealthStatus,
    pub vendor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// Full gateway report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayHealth {
    /// "ok" when every provider is healthy, "degraded" otherwise
    pub gateway: String,
    pub mode: String,
    pub providers: BTreeMap<String, ProviderHealth>,
}

impl GatewayHealth {
    pub fn new(mode: &str, providers: BTreeMap<String, ProviderHealth>) -> Self {
        let all_healthy = providers
            .values()
            .all(|p| p.status == HealthStatus::Healthy);

        Self {
            gateway: if all_healthy { "ok" } else { "degraded" }.to_string(),
            mode: mode.to_string(),
            providers,
        }
    }
}

/// Probe a single provider with a hard deadline
pub async fn probe_provider(provider: Arc<dyn LlmProvider>, timeout: Duration) -> ProviderHealth {
    let start = Instant::now();
    let vendor = provider.vendor().to_string();

    let (status, message) = match tokio::time::timeout(timeout, provider.health_check()).await {
        Ok(Ok(())) => (HealthStatus::Healthy, None),
        Ok(Err(e)) => {
            warn!(provider = provider.name(), error = %e, "Provider health check failed");
            (HealthStatus::from_error(&e), Some(e.to_string()))
        }
        Err(_) => {
            warn!(
                provider = provider.name(),
                timeout_ms = timeout.as_millis() as u64,
                "Provider health check timed out"
            );
            (
                HealthStatus::Offline,
                Some(format!("no answer within {}ms", timeout.as_millis())),
            )
        }
    };

    let response_time_ms = start.elapsed().as_millis() as u64;
    debug!(
        provider = provider.name(),
        status = ?status,
        response_time_ms,
        "Provider health check finished"
    );

    ProviderHealth {
        status,
        vendor,
        message,
        response_time_ms,
    }
}

/// Probe every provider concurrently
pub async fn probe_all(
    providers: &BTreeMap<String, Arc<dyn LlmProvider>>,
    timeout: Duration,
) -> BTreeMap<String, ProviderHealth> {
    let probes = providers.iter().map(|(name, provider)| {
        let provider = provider.clone();
        let name = name.clone();
        async move { (name, probe_provider(provider, timeout).await) }
    });

    join_all(probes).await.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::{CompletionRequest, CompletionResponse};
    use crate::testing::mocks::MockLlmProvider;
    use async_trait::async_trait;

    struct HangingProvider;

    #[async_trait]
    impl LlmProvider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn complete(&self, _: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            Err(LlmError::Cancelled)
        }

        async fn health_check(&self) -> Result<(), LlmError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            HealthStatus::from_error(&LlmError::NetworkError("refused".to_string())),
            HealthStatus::Offline
        );
        assert_eq!(
            HealthStatus::from_error(&LlmError::Timeout("5s elapsed".to_string())),
            HealthStatus::Offline
        );
        assert_eq!(
            HealthStatus::from_error(&LlmError::AuthenticationFailed("401".to_string())),
            HealthStatus::Unhealthy
        );
        assert_eq!(
            HealthStatus::from_error(&LlmError::ServerError {
                status: 500,
                message: "oops".to_string()
            }),
            HealthStatus::Error
        );
    }

    #[tokio::test]
    async fn test_hung_provider_does_not_stall_others() {
        let mut providers: BTreeMap<String, Arc<dyn LlmProvider>> = BTreeMap::new();
        providers.insert("hanging".to_string(), Arc::new(HangingProvider));
        providers.insert(
            "healthy".to_string(),
            Arc::new(MockLlmProvider::single_response("ok")),
        );

        let start = Instant::now();
        let report = probe_all(&providers, Duration::from_millis(50)).await;

        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(report["hanging"].status, HealthStatus::Offline);
        assert_eq!(report["healthy"].status, HealthStatus::Healthy);
    }

    #[test]
    fn test_gateway_summary() {
        let mut providers = BTreeMap::new();
        providers.insert(
            "openai".to_string(),
            ProviderHealth {
                status: HealthStatus::Healthy,
                vendor: "openai".to_string(),
                message: None,
                response_time_ms: 3,
            },
        );
        assert_eq!(GatewayHealth::new("live", providers.clone()).gateway, "ok");

        providers.insert(
            "ollama".to_string(),
            ProviderHealth {
                status: HealthStatus::Offline,
                vendor: "ollama".to_string(),
                message: Some("connection refused".to_string()),
                response_time_ms: 1,
            },
        );
        let health = GatewayHealth::new("live", providers);
        assert_eq!(health.gateway, "degraded");
        assert_eq!(health.providers.len(), 2);

        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["providers"]["ollama"]["status"], "offline");
        assert_eq!(json["providers"]["ollama"]["vendor"], "ollama");
    }
}
