//! Search capability: a model-driven loop over web search tools

pub mod agentic;

pub use agentic::{AgenticSearchConfig, AgenticSearcher};
