//! Agents and the A2A envelope they are invoked through
//!
//! Worker logic implements [`Agent`]; callers only ever see
//! [`AgentEnvelope::execute`], which validates, times, and contains failures
//! uniformly for every worker.

pub mod catalog;
pub mod envelope;
pub mod generative;
pub mod payload;
pub mod registry;

pub use catalog::{AgentName, AgentProfile, ModelTier, UnknownAgent};
pub use envelope::{
    Agent, AgentEnvelope, AgentOutput, AgentRequest, AgentResponse, ResponseMetadata,
    ResponseStatus, SystemContext,
};
pub use generative::GenerativeAgent;
pub use payload::{PayloadError, TaskPayload};
pub use registry::AgentRegistry;
