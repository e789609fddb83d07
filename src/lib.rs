//! A2A Orchestrator - Rust Implementation
//!
//! Routes free-text marketing requests to specialized agents, invokes them
//! through a uniform request/response envelope, runs multi-step workflows over
//! them, and reaches backend model providers through one generation gateway.
//!
//! # Overview
//!
//! - [`routing`]: deterministic intent, risk, agent, model and context deciders
//!   composed by [`routing::SmartRouter`]
//! - [`agent`]: the closed agent catalog, the A2A envelope and the stock
//!   generative worker
//! - [`workflow`]: static workflow definitions and the fail-fast executor
//! - [`gateway`]: provider resolution, generation and health checks
//! - [`orchestrator`]: the composition root tying them together
//!
//! # Quick Start
//!
//! ```rust
//! use a2a_orchestrator::agent::catalog::AgentName;
//! use a2a_orchestrator::routing::{RouteRequest, SmartRouter};
//! use serde_json::json;
//!
//! let router = SmartRouter::with_defaults();
//! let request = RouteRequest::new("user-1", "인스타그램 카피 작성해줘").with_context(
//!     json!({"product_name": "텀블러", "budget": 500000})
//!         .as_object()
//!         .cloned()
//!         .unwrap(),
//! );
//!
//! let decision = router.route(&request);
//! assert_eq!(decision.target_agent, AgentName::Copywriter);
//! assert!(decision.minimized_context.contains_key("product_name"));
//! assert!(!decision.minimized_context.contains_key("budget"));
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod gateway;
pub mod health;
pub mod llm;
pub mod observability;
pub mod orchestrator;
pub mod routing;
pub mod testing;
pub mod workflow;

/// Untyped JSON object used for payloads, contexts and results
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

pub use config::{ConfigError, GatewayMode, OrchestratorConfig};
pub use error::{OrchestratorError, OrchestratorResult, ProviderError};
pub use orchestrator::Orchestrator;
