//! LLM-based Router Implementation
//!
//! Asks the generation capability to pick between the math and retrieval
//! handlers. The reply is free text; [`Route::from_classification`] turns it into
//! a route, so an unexpected reply lands on retrieval rather than failing.

use crate::capability::Generator;
use crate::error::RunError;
use crate::routing::router::{Route, Router};
use std::sync::Arc;
use tracing::{debug, info};

/// Router that classifies queries with a single generation call
pub struct LlmRouter {
    generator: Arc<dyn Generator>,
}

impl LlmRouter {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Build the classification prompt (pure function)
    fn build_classification_prompt(query: &str) -> String {
        format!(
            r#"You are a router agent. Choose the best initial agent for the user query below.
You MUST choose ONLY one of: math_agent or rag_agent (do NOT choose search_agent here).

Query: {query}

Agent descriptions:
- math_agent: solves any calculation or numeric problem, including when written in words (e.g., "divide ten by two").
- rag_agent: answers from local documents (knowledge base). If RAG fails later, the system falls back to web search automatically.

Rules:
- If the query is any kind of calculation or math (even in words), choose math_agent.
- Otherwise choose rag_agent.

Respond with just the agent name."#
        )
    }
}

#[async_trait::async_trait]
impl Router for LlmRouter {
    async fn classify(&self, query: &str) -> Result<Route, RunError> {
        let prompt = Self::build_classification_prompt(query);
        debug!("Classification prompt:\n{}", prompt);

        let output = self
            .generator
            .generate(&prompt)
            .await
            .map_err(RunError::classification)?;

        let route = Route::from_classification(&output);
        info!(route = %route, classifier_output = %output.trim(), "Query routed");
        Ok(route)
    }
}
