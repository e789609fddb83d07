//! Testing utilities and mock implementations
//!
//! Mocks for exercising the orchestration core without any model provider
//! running. Public so integration tests can use them.

pub mod mocks;

pub use mocks::*;
