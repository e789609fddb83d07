//! Worker registry: agent name to envelope

use crate::agent::catalog::AgentName;
use crate::agent::envelope::{Agent, AgentEnvelope};
use crate::agent::generative::GenerativeAgent;
use crate::gateway::GenerationGateway;
use crate::observability::sink::DecisionLogSink;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Default)]
pub struct AgentRegistry {
    envelopes: BTreeMap<AgentName, Arc<AgentEnvelope>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One generative worker per catalog agent, all sharing one gateway
    pub fn with_generative_agents(
        gateway: Arc<GenerationGateway>,
        sink: Arc<dyn DecisionLogSink>,
        step_timeout: Option<Duration>,
    ) -> Self {
        let mut registry = Self::new();
        for name in AgentName::ALL {
            let agent = Arc::new(GenerativeAgent::new(name, gateway.clone()));
            registry.register(
                AgentEnvelope::new(agent, sink.clone()).with_timeout(step_timeout),
            );
        }
        registry
    }

    /// Wrap worker logic in an envelope and register it
    pub fn register_agent(
        &mut self,
        agent: Arc<dyn Agent>,
        sink: Arc<dyn DecisionLogSink>,
        timeout: Option<Duration>,
    ) {
        self.register(AgentEnvelope::new(agent, sink).with_timeout(timeout));
    }

    /// Register an envelope, replacing any previous one for the same agent
    pub fn register(&mut self, envelope: AgentEnvelope) {
        let name = envelope.name();
        if self.envelopes.insert(name, Arc::new(envelope)).is_some() {
            debug!(agent = %name, "Replaced registered agent");
        }
    }

    pub fn get(&self, name: AgentName) -> Option<Arc<AgentEnvelope>> {
        self.envelopes.get(&name).cloned()
    }

    pub fn names(&self) -> Vec<AgentName> {
        self.envelopes.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }
}
