//! Provider-agnostic generation gateway
//!
//! Maps a role/task (or an explicit model) to a concrete provider and model,
//! calls it, and normalizes the reply. Also reports provider health.

pub mod output;
pub mod prompts;
pub mod registry;
pub mod resolver;
pub mod service;

pub use registry::{build_providers, mock_providers, ProviderMap, ProviderSet};
pub use resolver::{ProviderResolver, Resolution, PROVIDER_PATTERNS, TASK_TIER_OVERRIDES};
pub use service::{
    GenerateError, GenerateOptions, GenerateOutput, GenerateRequest, GenerateResponse,
    GenerationGateway, GenerationMode,
};
