//! LLM provider abstraction layer
//!
//! A provider-agnostic chat-completion interface, its OpenAI-compatible
//! implementation, and the [`LlmGenerator`] adapter that exposes a provider as
//! the core's generation capability.

pub mod generator;
pub mod provider;
pub mod providers;

pub use generator::LlmGenerator;
pub use provider::*;
pub use providers::*;
