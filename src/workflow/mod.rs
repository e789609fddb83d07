//! Multi-step workflows over the agent registry

pub mod definition;
pub mod executor;
pub mod template;

pub use definition::{StepType, WorkflowDefinition, WorkflowRegistry, WorkflowStep};
pub use executor::{RunState, WorkflowExecutor, WorkflowResult, EXECUTOR_SOURCE};
pub use template::{render, TemplateContext, TemplateError};
