//! Observability for the orchestration core
//!
//! Structured logging through `tracing`, plus the decision-log sink that
//! receives one record per routing decision and per agent execution.

pub mod logging;
pub mod sink;

pub use logging::{init_default_logging, init_logging, LogFormat};
pub use sink::{AgentExecutionRecord, DecisionLogSink, RoutingRecord, TracingDecisionLog};

// Span macros for structured logging
pub use logging::{agent_span, provider_span, route_span, workflow_span};
