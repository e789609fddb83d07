//! Decision log sink
//!
//! The orchestration core hands one record to the sink after every
//! `route()` call and after every agent envelope execution. Persisting the
//! records is the sink's business; the default implementation emits them as
//! structured `tracing` events on the `decision_log` target.

use crate::agent::envelope::ResponseStatus;
use crate::llm::provider::TokenUsage;
use crate::routing::{RiskLevel, RoutingMetadata};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Record emitted after each agent envelope execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentExecutionRecord {
    pub request_id: String,
    pub agent_name: String,
    pub source_agent: String,
    pub target_agent: String,
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub execution_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
    pub context_size_bytes: usize,
}

/// Record emitted after each routing decision
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingRecord {
    pub request_text: String,
    pub detected_intent: String,
    pub selected_agent: String,
    pub selected_model: String,
    pub risk_level: RiskLevel,
    pub decision_metadata: RoutingMetadata,
}

/// Receiver of routing and execution records
///
/// Called inline on the request path, so implementations must not block;
/// buffer or hand off to a background task if persistence is slow.
pub trait DecisionLogSink: Send + Sync {
    fn record_agent_execution(&self, record: &AgentExecutionRecord);

    fn record_routing(&self, record: &RoutingRecord);
}

/// Sink that writes every record as a structured log event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDecisionLog;

impl DecisionLogSink for TracingDecisionLog {
    fn record_agent_execution(&self, record: &AgentExecutionRecord) {
        info!(
            target: "decision_log",
            request_id = %record.request_id,
            agent_name = %record.agent_name,
            source_agent = %record.source_agent,
            target_agent = %record.target_agent,
            status = ?record.status,
            error_message = record.error_message.as_deref().unwrap_or(""),
            execution_time_ms = record.execution_time_ms,
            total_tokens = record.token_usage.as_ref().map(|u| u.total_tokens).unwrap_or(0),
            context_size_bytes = record.context_size_bytes,
            "agent execution"
        );
    }

    fn record_routing(&self, record: &RoutingRecord) {
        info!(
            target: "decision_log",
            detected_intent = %record.detected_intent,
            selected_agent = %record.selected_agent,
            selected_model = %record.selected_model,
            risk_level = ?record.risk_level,
            confidence = record.decision_metadata.confidence,
            reasoning = %record.decision_metadata.reasoning,
            request_chars = record.request_text.chars().count(),
            "routing decision"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_record_omits_empty_optionals() {
        let record = AgentExecutionRecord {
            request_id: "req-1".to_string(),
            agent_name: "copywriter".to_string(),
            source_agent: "router".to_string(),
            target_agent: "copywriter".to_string(),
            status: ResponseStatus::Success,
            error_message: None,
            execution_time_ms: 12,
            token_usage: None,
            context_size_bytes: 64,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("error_message"));
        assert!(!json.contains("token_usage"));
        assert!(json.contains("\"status\":\"success\""));
    }

    #[test]
    fn test_tracing_sink_accepts_records() {
        let sink = TracingDecisionLog;
        sink.record_routing(&RoutingRecord {
            request_text: "카피 작성해줘".to_string(),
            detected_intent: "copywriting".to_string(),
            selected_agent: "copywriter".to_string(),
            selected_model: "qwen2.5:7b".to_string(),
            risk_level: RiskLevel::Low,
            decision_metadata: RoutingMetadata {
                intent: "copywriting".to_string(),
                confidence: 0.8,
                reasoning: "keyword match".to_string(),
            },
        });
    }
}
