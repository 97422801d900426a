//! Arithmetic handler
//!
//! Correctness of the arithmetic belongs to the generation capability; the
//! handler only trims what comes back.

use crate::capability::Generator;
use crate::error::{RunError, Stage};
use std::sync::Arc;
use tracing::debug;

pub struct MathHandler {
    generator: Arc<dyn Generator>,
}

impl MathHandler {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    fn build_prompt(query: &str) -> String {
        format!("Solve this math problem and return only the answer: {query}")
    }

    /// Answer a calculation, returned trimmed and otherwise untouched
    pub async fn solve(&self, query: &str) -> Result<String, RunError> {
        let prompt = Self::build_prompt(query);
        debug!("Math prompt:\n{}", prompt);

        let output = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|e| RunError::generation(Stage::Math, e))?;

        Ok(output.trim().to_string())
    }
}
