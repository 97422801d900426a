//! Retrieval-augmented answering
//!
//! Retrieves excerpts, asks the generation capability to answer from them alone,
//! and reports [`RagOutcome::Insufficient`] when there is nothing to answer from.
//!
//! Insufficiency has two sources:
//!
//! 1. Retrieval returned no excerpts. Generation is skipped entirely.
//! 2. The generation output, once trimmed, is exactly
//!    [`INSUFFICIENT_CONTEXT_SENTINEL`]. The comparison is case-sensitive and
//!    does not tolerate extra punctuation or words; a near-miss is an answer.
//!
//! The sentinel is checked here and nowhere else. Callers only see the tag.

use crate::capability::{Excerpt, Generator, Retriever};
use crate::error::{RunError, Stage};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reply the generation capability uses to say the context cannot answer
pub const INSUFFICIENT_CONTEXT_SENTINEL: &str = "NOT_ENOUGH_CONTEXT";

/// Number of excerpts requested per query
pub const DEFAULT_TOP_K: usize = 3;

const CONTEXT_SEPARATOR: &str = "\n\n";

/// Result of answering from local context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RagOutcome {
    Answered(String),
    Insufficient,
}

pub struct RagHandler {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    top_k: usize,
}

impl RagHandler {
    pub fn new(retriever: Arc<dyn Retriever>, generator: Arc<dyn Generator>) -> Self {
        Self {
            retriever,
            generator,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    fn build_context(excerpts: &[Excerpt]) -> String {
        excerpts
            .iter()
            .map(|excerpt| excerpt.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }

    fn build_prompt(context: &str, query: &str) -> String {
        format!(
            r#"You are a retrieval-augmented assistant.
Answer using ONLY the context below.
If the context is insufficient to answer the question, reply with EXACTLY:
{INSUFFICIENT_CONTEXT_SENTINEL}
(no extra words, punctuation, or explanation).

# Context:
{context}

# Question:
{query}"#
        )
    }

    /// Answer `query` from retrieved context, or report that it cannot be
    pub async fn answer_from_context(&self, query: &str) -> Result<RagOutcome, RunError> {
        let excerpts = self
            .retriever
            .retrieve(query, self.top_k)
            .await
            .map_err(RunError::retrieval)?;

        if excerpts.is_empty() {
            warn!(reason = "no_documents", "Retrieved context is insufficient");
            return Ok(RagOutcome::Insufficient);
        }
        debug!(excerpts = excerpts.len(), "Context retrieved");

        let prompt = Self::build_prompt(&Self::build_context(&excerpts), query);
        debug!("RAG prompt:\n{}", prompt);

        let output = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|e| RunError::generation(Stage::RagGenerate, e))?;

        let outcome = Self::interpret_output(&output);
        if outcome == RagOutcome::Insufficient {
            warn!(reason = "sentinel", "Retrieved context is insufficient");
        }
        Ok(outcome)
    }

    /// Trimmed output equal to the sentinel is insufficiency; anything else is an answer
    fn interpret_output(output: &str) -> RagOutcome {
        let answer = output.trim();
        if answer == INSUFFICIENT_CONTEXT_SENTINEL {
            RagOutcome::Insufficient
        } else {
            RagOutcome::Answered(answer.to_string())
        }
    }
}
