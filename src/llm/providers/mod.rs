//! LLM provider implementations
//!
//! Concrete [`LlmProvider`](crate::llm::provider::LlmProvider) backends plus
//! the offline mock variant.

pub mod anthropic;
pub mod google;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use google::{GoogleConfig, GoogleProvider};
pub use mock::MockProvider;
pub use ollama::{OllamaConfig, OllamaProvider};
pub use openai::{OpenAiConfig, OpenAiProvider};
