//! Generation capability backed by an [`LlmProvider`]

use crate::capability::{CapabilityError, Generator};
use crate::llm::provider::{CompletionRequest, LlmProvider, Message};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Sends each prompt as a single user message and returns the reply text
pub struct LlmGenerator {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl LlmGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.5,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_request(&self, prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
            tools: None,
        }
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, CapabilityError> {
        let response = self.provider.complete(self.build_request(prompt)).await?;

        debug!(
            provider = self.provider.name(),
            model = %response.model,
            total_tokens = response.usage.total_tokens,
            "Generation complete"
        );

        // A reply without content reads as empty text; callers trim and decide
        Ok(response.content.unwrap_or_default())
    }
}
