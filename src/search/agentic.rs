//! Tool-augmented search loop
//!
//! The model is given the web search tool and keeps calling it until it
//! produces a plain answer or runs out of iterations.

use crate::capability::{CapabilityError, Searcher};
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Message, ToolCall,
};
use crate::tools::ToolSet;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

const SEARCH_SYSTEM_PROMPT: &str = "You are a research assistant with access to a web search tool. \
Use the web_search tool to find current, factual information for the user's question, \
then answer concisely using what you found. If the results do not contain the answer, say so.";

const UNDECODED_TOOL_CALLS_NOTICE: &str = "Your tool call arguments could not be parsed as JSON. \
Call the tool again with valid JSON arguments, or answer directly.";

/// Settings for the search loop
#[derive(Debug, Clone)]
pub struct AgenticSearchConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_iterations: usize,
}

impl AgenticSearchConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
            max_iterations: 5,
        }
    }
}

/// Search capability that lets the model drive web search tool calls
pub struct AgenticSearcher {
    provider: Arc<dyn LlmProvider>,
    tools: ToolSet,
    config: AgenticSearchConfig,
}

impl AgenticSearcher {
    pub fn new(provider: Arc<dyn LlmProvider>, tools: ToolSet, config: AgenticSearchConfig) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    fn build_request(&self, messages: &[Message]) -> CompletionRequest {
        CompletionRequest {
            model: self.config.model.clone(),
            messages: messages.to_vec(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            tools: if self.tools.is_empty() {
                None
            } else {
                Some(self.tools.descriptions())
            },
        }
    }

    /// Failed tool calls are reported back to the model rather than aborting
    async fn execute_tool_calls(&self, tool_calls: &[ToolCall]) -> Vec<String> {
        let mut results = Vec::with_capacity(tool_calls.len());

        for call in tool_calls {
            debug!(tool = %call.name, arguments = %call.arguments, "Executing tool call");
            match self.tools.execute_tool(&call.name, &call.arguments).await {
                Ok(value) => results.push(format!("Tool {} returned: {}", call.name, value)),
                Err(e) => {
                    warn!(tool = %call.name, "Tool call failed: {}", e);
                    results.push(format!("Tool {} failed: {}", call.name, e));
                }
            }
        }

        results
    }

    fn record_turn(messages: &mut Vec<Message>, response: &CompletionResponse, results: &[String]) {
        if let Some(content) = response.content.as_deref().filter(|c| !c.is_empty()) {
            messages.push(Message::assistant(content));
        }
        if !results.is_empty() {
            messages.push(Message::user(format!(
                "Tool results:\n{}",
                results.join("\n")
            )));
        }
    }
}

#[async_trait]
impl Searcher for AgenticSearcher {
    async fn search(&self, query: &str) -> Result<String, CapabilityError> {
        let mut messages = vec![Message::system(SEARCH_SYSTEM_PROMPT), Message::user(query)];

        for iteration in 1..=self.config.max_iterations {
            let response = self.provider.complete(self.build_request(&messages)).await?;

            let tool_calls = response.pending_tool_calls();
            if tool_calls.is_empty() {
                // The provider drops calls it cannot decode; tell the model and go again
                if response.finish_reason == FinishReason::ToolCalls {
                    warn!(iteration, "Tool calls requested but none could be decoded");
                    Self::record_turn(&mut messages, &response, &[]);
                    messages.push(Message::user(UNDECODED_TOOL_CALLS_NOTICE));
                    continue;
                }

                return match response.content {
                    Some(answer) if !answer.trim().is_empty() => {
                        info!(iterations = iteration, "Search loop produced an answer");
                        Ok(answer)
                    }
                    _ => {
                        warn!(iteration, "Search loop ended without answer text");
                        Err(CapabilityError::InvalidResponse(
                            "Search finished without an answer".to_string(),
                        ))
                    }
                };
            }

            debug!(iteration, tool_count = tool_calls.len(), "Processing tool calls");
            let results = self.execute_tool_calls(tool_calls).await;
            Self::record_turn(&mut messages, &response, &results);
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "Search loop did not converge"
        );
        Err(CapabilityError::IterationLimit(self.config.max_iterations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::MessageRole;
    use crate::testing::mocks::{MockLlmProvider, MockTool};
    use serde_json::json;

    fn tool_call(query: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: "web_search".to_string(),
            arguments: json!({"query": query}),
        }
    }

    fn searcher(provider: Arc<MockLlmProvider>, tool: Arc<MockTool>, max: usize) -> AgenticSearcher {
        let mut config = AgenticSearchConfig::new("mock-model");
        config.max_iterations = max;
        AgenticSearcher::new(provider, ToolSet::new().with_tool(tool), config)
    }

    #[tokio::test]
    async fn test_direct_answer_without_tools() {
        let provider = Arc::new(MockLlmProvider::single_response("Paris"));
        let tool = Arc::new(MockTool::new("web_search", json!({})));

        let answer = searcher(provider.clone(), tool.clone(), 3)
            .search("capital of France")
            .await
            .unwrap();

        assert_eq!(answer, "Paris");
        assert!(tool.executed().await.is_empty());

        let requests = provider.recorded_requests().await;
        assert_eq!(requests[0].messages[0].role, MessageRole::System);
        assert_eq!(requests[0].messages[1], Message::user("capital of France"));
        assert_eq!(requests[0].tools.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_tool_results_are_fed_back() {
        let provider = Arc::new(MockLlmProvider::scripted(vec![
            MockLlmProvider::tool_call_response(vec![tool_call("refund policy")]),
            MockLlmProvider::text_response("No refund policy found online"),
        ]));
        let tool = Arc::new(MockTool::new("web_search", json!({"results": []})));

        let answer = searcher(provider.clone(), tool.clone(), 3)
            .search("what is our refund policy")
            .await
            .unwrap();

        assert_eq!(answer, "No refund policy found online");
        assert_eq!(tool.executed().await, vec![json!({"query": "refund policy"})]);

        let requests = provider.recorded_requests().await;
        assert_eq!(requests.len(), 2);
        let last = requests[1].messages.last().unwrap();
        assert_eq!(last.role, MessageRole::User);
        assert!(last.content.starts_with("Tool results:\nTool web_search returned:"));
    }

    #[tokio::test]
    async fn test_tool_failure_is_reported_to_model() {
        let provider = Arc::new(MockLlmProvider::scripted(vec![
            MockLlmProvider::tool_call_response(vec![tool_call("x")]),
            MockLlmProvider::text_response("Search is unavailable right now"),
        ]));
        let tool = Arc::new(MockTool::failing("web_search"));

        let answer = searcher(provider.clone(), tool, 3).search("x").await.unwrap();

        assert_eq!(answer, "Search is unavailable right now");
        let requests = provider.recorded_requests().await;
        let last = requests[1].messages.last().unwrap();
        assert!(last.content.contains("Tool web_search failed"));
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let provider = Arc::new(MockLlmProvider::scripted(vec![
            MockLlmProvider::tool_call_response(vec![tool_call("again")]),
        ]));
        let tool = Arc::new(MockTool::new("web_search", json!({})));

        let result = searcher(provider.clone(), tool, 2).search("loop").await;

        assert_eq!(result, Err(CapabilityError::IterationLimit(2)));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_undecodable_tool_calls_are_reported_and_retried() {
        // Finish reason says tools, but every call was dropped while decoding
        let provider = Arc::new(MockLlmProvider::scripted(vec![
            MockLlmProvider::tool_call_response(vec![]),
            MockLlmProvider::text_response("Refunds are accepted within 30 days"),
        ]));
        let tool = Arc::new(MockTool::new("web_search", json!({})));

        let answer = searcher(provider.clone(), tool.clone(), 3)
            .search("refund policy")
            .await
            .unwrap();

        assert_eq!(answer, "Refunds are accepted within 30 days");
        assert!(tool.executed().await.is_empty());

        let requests = provider.recorded_requests().await;
        assert_eq!(requests.len(), 2);
        let last = requests[1].messages.last().unwrap();
        assert_eq!(last.role, MessageRole::User);
        assert!(last.content.contains("could not be parsed"));
    }

    #[tokio::test]
    async fn test_undecodable_tool_calls_never_become_an_empty_answer() {
        let provider = Arc::new(MockLlmProvider::scripted(vec![
            MockLlmProvider::tool_call_response(vec![]),
        ]));
        let tool = Arc::new(MockTool::new("web_search", json!({})));

        let result = searcher(provider.clone(), tool, 2).search("x").await;

        assert_eq!(result, Err(CapabilityError::IterationLimit(2)));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_blank_final_answer_is_invalid() {
        for response in [
            MockLlmProvider::text_response(""),
            MockLlmProvider::text_response("  \n"),
        ] {
            let provider = Arc::new(MockLlmProvider::scripted(vec![response]));
            let tool = Arc::new(MockTool::new("web_search", json!({})));

            let result = searcher(provider, tool, 3).search("x").await;
            assert!(matches!(result, Err(CapabilityError::InvalidResponse(_))));
        }

        let provider = Arc::new(MockLlmProvider::without_content());
        let tool = Arc::new(MockTool::new("web_search", json!({})));
        let result = searcher(provider, tool, 3).search("x").await;
        assert!(matches!(result, Err(CapabilityError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let provider = Arc::new(MockLlmProvider::with_failure());
        let tool = Arc::new(MockTool::new("web_search", json!({})));

        let result = searcher(provider, tool, 2).search("x").await;
        assert!(matches!(result, Err(CapabilityError::Unavailable(_))));
    }
}
