//! Generation gateway integration tests
//!
//! Provider resolution tables, health reporting with unreachable backends,
//! and error classification seen by callers.

use a2a_orchestrator::config::{GatewayMode, ModelTiers, OrchestratorConfig};
use a2a_orchestrator::gateway::{
    GenerateError, GenerateRequest, GenerationGateway, ProviderMap, ProviderResolver,
};
use a2a_orchestrator::health::HealthStatus;
use a2a_orchestrator::llm::provider::LlmProvider;
use a2a_orchestrator::llm::providers::{
    AnthropicConfig, AnthropicProvider, GoogleConfig, GoogleProvider, OllamaConfig, OllamaProvider,
    OpenAiConfig, OpenAiProvider,
};
use a2a_orchestrator::JsonMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Port 1 is never listening in the test environment
const UNREACHABLE: &str = "http://127.0.0.1:1";

fn resolver() -> ProviderResolver {
    ProviderResolver::new("ollama", ModelTiers::default())
}

#[test]
fn test_provider_name_resolution() {
    let resolver = resolver();

    assert_eq!(resolver.provider_for_model("GPT-4O"), "openai");
    assert_eq!(resolver.provider_for_model("qwen2.5:7b"), "ollama");
    assert_eq!(resolver.provider_for_model("totally-unknown-model"), "ollama");
    assert_eq!(resolver.provider_for_model("Claude-3-5-Sonnet"), "anthropic");
    assert_eq!(resolver.provider_for_model("gemini-1.5-pro"), "google");
    assert_eq!(resolver.provider_for_model("o1-mini"), "openai");
    assert_eq!(resolver.provider_for_model("mixtral:8x7b"), "ollama");
}

#[test]
fn test_tier_resolution_uses_task_override() {
    let resolver = resolver();

    let default = resolver.resolve("copywriter", "product_copy", None);
    assert_eq!(default.model, "qwen2.5:7b");
    assert_eq!(default.provider, "ollama");

    let raised = resolver.resolve("strategist", "brand_strategy", None);
    assert_eq!(raised.model, "gpt-4o");
    assert_eq!(raised.provider, "openai");

    let explicit = resolver.resolve("copywriter", "product_copy", Some("claude-3-5-haiku-20241022"));
    assert_eq!(explicit.provider, "anthropic");
    assert!(explicit.tier.is_none());
}

fn unreachable_providers(timeout: Duration) -> ProviderMap {
    let mut providers = ProviderMap::new();
    let openai: Arc<dyn LlmProvider> = Arc::new(
        OpenAiProvider::new(OpenAiConfig {
            api_key: "test-key".to_string(),
            base_url: UNREACHABLE.to_string(),
            timeout,
        })
        .unwrap(),
    );
    let anthropic: Arc<dyn LlmProvider> = Arc::new(
        AnthropicProvider::new(AnthropicConfig {
            api_key: "test-key".to_string(),
            base_url: UNREACHABLE.to_string(),
            timeout,
            ..Default::default()
        })
        .unwrap(),
    );
    let google: Arc<dyn LlmProvider> = Arc::new(
        GoogleProvider::new(GoogleConfig {
            api_key: "test-key".to_string(),
            base_url: UNREACHABLE.to_string(),
            timeout,
        })
        .unwrap(),
    );
    let ollama: Arc<dyn LlmProvider> = Arc::new(
        OllamaProvider::new(OllamaConfig {
            base_url: UNREACHABLE.to_string(),
            timeout,
        })
        .unwrap(),
    );

    providers.insert("openai".to_string(), openai);
    providers.insert("anthropic".to_string(), anthropic);
    providers.insert("google".to_string(), google);
    providers.insert("ollama".to_string(), ollama);
    providers
}

#[tokio::test]
async fn test_health_check_never_fails_when_everything_is_down() {
    let gateway = GenerationGateway::new(
        GatewayMode::Live,
        unreachable_providers(Duration::from_secs(2)),
        resolver(),
        Duration::from_millis(500),
    );

    let start = Instant::now();
    let health = gateway.health_check().await;

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(health.gateway, "degraded");
    assert_eq!(health.mode, "live");
    assert_eq!(health.providers.len(), 4);
    for (name, report) in &health.providers {
        assert!(
            matches!(
                report.status,
                HealthStatus::Healthy
                    | HealthStatus::Unhealthy
                    | HealthStatus::Error
                    | HealthStatus::Offline
            ),
            "{name}"
        );
        assert_ne!(report.status, HealthStatus::Healthy, "{name}");
        assert_eq!(report.vendor, name.as_str());
    }
}

#[tokio::test]
async fn test_health_check_reports_providers_that_could_not_be_built() {
    let mut config = OrchestratorConfig::with_defaults();
    config.gateway.mode = GatewayMode::Live;
    config.gateway.health_timeout_ms = 500;
    for section in config.providers.values_mut() {
        if section.api_key_env.is_some() {
            section.api_key_env = Some("A2A_TEST_KEY_THAT_IS_NEVER_SET".to_string());
        }
        section.base_url = Some(UNREACHABLE.to_string());
    }

    let health = GenerationGateway::from_config(&config).health_check().await;

    assert_eq!(
        health.providers.keys().collect::<Vec<_>>(),
        config.providers.keys().collect::<Vec<_>>()
    );
    for name in ["anthropic", "google", "openai"] {
        let report = &health.providers[name];
        assert_eq!(report.status, HealthStatus::Unhealthy, "{name}");
        assert_eq!(report.vendor, name);
        assert!(report.message.is_some(), "{name}");
    }
    assert_eq!(health.providers["ollama"].status, HealthStatus::Offline);
    assert_eq!(health.gateway, "degraded");
}

#[tokio::test]
async fn test_unreachable_provider_generate_is_retryable() {
    let gateway = GenerationGateway::new(
        GatewayMode::Live,
        unreachable_providers(Duration::from_secs(2)),
        resolver(),
        Duration::from_millis(500),
    );

    let err = gateway
        .generate(
            GenerateRequest::new("copywriter", "product_copy", JsonMap::new()),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        GenerateError::Provider(e) => {
            assert_eq!(e.provider, "ollama");
            assert!(e.retryable);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_auth_failure_is_not_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"message": "Incorrect API key provided"}
        })))
        .mount(&server)
        .await;

    let mut providers = ProviderMap::new();
    providers.insert(
        "openai".to_string(),
        Arc::new(
            OpenAiProvider::new(OpenAiConfig {
                api_key: "bad-key".to_string(),
                base_url: server.uri(),
                timeout: Duration::from_secs(5),
            })
            .unwrap(),
        ),
    );
    let gateway = GenerationGateway::new(
        GatewayMode::Live,
        providers,
        resolver(),
        Duration::from_millis(500),
    );

    let err = gateway
        .generate(
            GenerateRequest::new("copywriter", "product_copy", JsonMap::new())
                .with_override_model("gpt-4o-mini"),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        GenerateError::Provider(e) => {
            assert_eq!(e.provider, "openai");
            assert!(!e.retryable);
            assert_eq!(e.details["kind"], "authentication_failed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
        .mount(&server)
        .await;

    let mut providers = ProviderMap::new();
    providers.insert(
        "ollama".to_string(),
        Arc::new(
            OllamaProvider::new(OllamaConfig {
                base_url: server.uri(),
                timeout: Duration::from_secs(5),
            })
            .unwrap(),
        ),
    );
    let gateway = GenerationGateway::new(
        GatewayMode::Live,
        providers,
        resolver(),
        Duration::from_millis(500),
    );

    let err = gateway
        .generate(
            GenerateRequest::new("editor", "content_edit", JsonMap::new()),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(err.is_retryable());
}
