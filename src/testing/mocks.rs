//! Mock implementations for testing
//!
//! Provides mock Generator, Retriever, Searcher, LlmProvider and Tool
//! implementations so the routing core can be exercised without a model, a
//! corpus on disk, or network access.

use crate::capability::{CapabilityError, Excerpt, Generator, Retriever, Searcher};
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, TokenUsage,
    ToolCall,
};
use crate::tools::{Tool, ToolDescription, ToolError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

type GenerateResult = Result<String, CapabilityError>;

/// Mock generator for testing
///
/// Rules registered with [`MockGenerator::when`] match on a substring of the
/// prompt and take priority. Otherwise scripted responses are returned in order,
/// cycling once exhausted.
#[derive(Debug, Default)]
pub struct MockGenerator {
    rules: Vec<(String, GenerateResult)>,
    script: Vec<GenerateResult>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockGenerator {
    pub fn new(responses: Vec<&str>) -> Self {
        Self::scripted(responses.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn scripted(script: Vec<GenerateResult>) -> Self {
        Self {
            script,
            ..Default::default()
        }
    }

    pub fn single_response(response: impl Into<String>) -> Self {
        Self::scripted(vec![Ok(response.into())])
    }

    pub fn with_failure() -> Self {
        Self::failing_with(CapabilityError::Unavailable(
            "Mock generator failure".to_string(),
        ))
    }

    pub fn failing_with(error: CapabilityError) -> Self {
        Self::scripted(vec![Err(error)])
    }

    /// Answer `response` to any prompt containing `needle`
    pub fn when(mut self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules.push((needle.into(), Ok(response.into())));
        self
    }

    /// Fail any prompt containing `needle`
    pub fn when_fails(mut self, needle: impl Into<String>, error: CapabilityError) -> Self {
        self.rules.push((needle.into(), Err(error)));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, CapabilityError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some((_, result)) = self.rules.iter().find(|(needle, _)| prompt.contains(needle)) {
            return result.clone();
        }

        if self.script.is_empty() {
            return Ok("Mock response".to_string());
        }
        self.script[call % self.script.len()].clone()
    }
}

/// Mock retriever for testing
#[derive(Debug, Default)]
pub struct MockRetriever {
    excerpts: Vec<Excerpt>,
    failure: Option<CapabilityError>,
    calls: AtomicUsize,
    requests: Arc<Mutex<Vec<(String, usize)>>>,
}

impl MockRetriever {
    /// Returns these excerpts (truncated to `k`) for every query
    pub fn new(excerpts: Vec<&str>) -> Self {
        Self {
            excerpts: excerpts.into_iter().map(Excerpt::new).collect(),
            ..Default::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_failure() -> Self {
        Self {
            failure: Some(CapabilityError::Unavailable(
                "Mock retriever failure".to_string(),
            )),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every `(query, k)` the retriever was asked for
    pub async fn requests(&self) -> Vec<(String, usize)> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Excerpt>, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push((query.to_string(), k));

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(self.excerpts.iter().take(k).cloned().collect())
    }
}

/// Mock searcher for testing
#[derive(Debug)]
pub struct MockSearcher {
    result: Result<String, CapabilityError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockSearcher {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            result: Ok(answer.into()),
            delay: None,
            calls: AtomicUsize::new(0),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_failure() -> Self {
        Self::failing_with(CapabilityError::Unavailable(
            "Mock searcher failure".to_string(),
        ))
    }

    pub fn failing_with(error: CapabilityError) -> Self {
        Self {
            result: Err(error),
            ..Self::new("")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn queries(&self) -> Vec<String> {
        self.queries.lock().await.clone()
    }
}

#[async_trait]
impl Searcher for MockSearcher {
    async fn search(&self, query: &str) -> Result<String, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().await.push(query.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

/// Mock LLM provider for testing
#[derive(Debug, Default)]
pub struct MockLlmProvider {
    responses: Vec<CompletionResponse>,
    should_fail: bool,
    calls: AtomicUsize,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self::scripted(responses.iter().map(|r| Self::text_response(r)).collect())
    }

    /// Return these responses in order, cycling once exhausted
    pub fn scripted(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses,
            ..Default::default()
        }
    }

    pub fn single_response(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// A reply with neither content nor tool calls
    pub fn without_content() -> Self {
        let mut response = Self::text_response("");
        response.content = None;
        Self::scripted(vec![response])
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    pub fn text_response(content: &str) -> CompletionResponse {
        CompletionResponse {
            content: Some(content.to_string()),
            model: "mock-model".to_string(),
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
            finish_reason: FinishReason::Stop,
            tool_calls: None,
        }
    }

    pub fn tool_call_response(tool_calls: Vec<ToolCall>) -> CompletionResponse {
        CompletionResponse {
            content: None,
            finish_reason: FinishReason::ToolCalls,
            tool_calls: Some(tool_calls),
            ..Self::text_response("")
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request);

        if self.should_fail {
            return Err(LlmError::RequestFailed("Mock LLM failure".to_string()));
        }

        if self.responses.is_empty() {
            return Ok(Self::text_response("Mock response"));
        }
        Ok(self.responses[call % self.responses.len()].clone())
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        if self.should_fail {
            Err(LlmError::RequestFailed(
                "Mock health check failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

/// Mock tool taking a single required `query` string
#[derive(Debug)]
pub struct MockTool {
    name: String,
    response: Option<Value>,
    executed: Arc<Mutex<Vec<Value>>>,
}

impl MockTool {
    pub fn new(name: impl Into<String>, response: Value) -> Self {
        Self {
            name: name.into(),
            response: Some(response),
            executed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            response: None,
            ..Self::new(name, Value::Null)
        }
    }

    /// Parameters of every execution that reached the tool
    pub async fn executed(&self) -> Vec<Value> {
        self.executed.lock().await.clone()
    }
}

#[async_trait]
impl Tool for MockTool {
    fn describe(&self) -> ToolDescription {
        ToolDescription {
            name: self.name.clone(),
            description: "Mock tool for testing".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"}
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        }
    }

    async fn execute(&self, parameters: &Value) -> Result<Value, ToolError> {
        self.executed.lock().await.push(parameters.clone());

        self.response
            .clone()
            .ok_or_else(|| ToolError::ExecutionError("Mock tool failure".to_string()))
    }
}
