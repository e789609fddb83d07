//! LLM provider abstraction layer
//!
//! A provider-agnostic completion interface with one implementation per
//! backend vendor.

pub mod provider;
pub mod providers;

pub use provider::*;
pub use providers::*;
