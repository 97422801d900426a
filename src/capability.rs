//! External capabilities consumed by the routing core
//!
//! The core never talks to a model, an index, or a search API directly. It calls
//! through these three narrow traits, which the host wires to concrete
//! implementations ([`crate::llm::LlmGenerator`], [`crate::retrieval::DocumentIndex`],
//! [`crate::search::AgenticSearcher`]) or to test doubles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single retrieved document excerpt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Excerpt {
    pub content: String,
}

impl Excerpt {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Failure of an external capability call
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CapabilityError {
    #[error("Capability unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid capability response: {0}")]
    InvalidResponse(String),
    #[error("Gave up after {0} iterations without a final answer")]
    IterationLimit(usize),
}

impl From<crate::llm::provider::LlmError> for CapabilityError {
    fn from(error: crate::llm::provider::LlmError) -> Self {
        use crate::llm::provider::LlmError;

        match error {
            LlmError::InvalidResponse(message) => Self::InvalidResponse(message),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

impl From<crate::tools::ToolError> for CapabilityError {
    fn from(error: crate::tools::ToolError) -> Self {
        Self::Unavailable(error.to_string())
    }
}

/// Turns a prompt into text
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, CapabilityError>;
}

/// Returns up to `k` excerpts relevant to `query`, most relevant first
///
/// An empty result is a normal outcome, not an error.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Excerpt>, CapabilityError>;
}

/// Answers `query` using whatever tool-augmented process sits behind it
#[async_trait]
pub trait Searcher: Send + Sync {
    async fn search(&self, query: &str) -> Result<String, CapabilityError>;
}
