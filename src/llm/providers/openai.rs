//! OpenAI-compatible chat-completions provider
//!
//! Works against any endpoint that speaks the `/chat/completions` dialect
//! (OpenAI itself, Gemini's OpenAI-compatible endpoint, local gateways).

use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, Message,
    MessageRole, TokenUsage, ToolCall,
};
use crate::tools::ToolDescription;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Delays before each retry; the first attempt goes out immediately
const RETRY_BACKOFF_MS: [u64; 3] = [100, 200, 300];

/// OpenAI provider configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// OpenAI provider implementation
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::NotConfigured(
                "OpenAI API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn to_wire_request(request: &CompletionRequest) -> WireRequest {
        WireRequest {
            model: request.model.clone(),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: request
                .tools
                .as_ref()
                .filter(|tools| !tools.is_empty())
                .map(|tools| tools.iter().map(WireTool::from).collect()),
        }
    }

    fn from_wire_response(response: WireResponse) -> Result<CompletionResponse, LlmError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No choices returned".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .map(|calls| Self::parse_tool_calls(&calls));

        Ok(CompletionResponse {
            content: choice.message.content,
            model: response.model,
            usage: response
                .usage
                .map(|u| TokenUsage {
                    prompt_tokens: u.prompt_tokens,
                    completion_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                })
                .unwrap_or_default(),
            finish_reason: Self::parse_finish_reason(choice.finish_reason.as_deref()),
            tool_calls,
        })
    }

    /// Tool arguments arrive as a JSON string; calls we cannot decode are dropped
    fn parse_tool_calls(calls: &[WireToolCall]) -> Vec<ToolCall> {
        calls
            .iter()
            .filter_map(
                |call| match serde_json::from_str(&call.function.arguments) {
                    Ok(arguments) => Some(ToolCall {
                        id: call.id.clone(),
                        name: call.function.name.clone(),
                        arguments,
                    }),
                    Err(e) => {
                        error!(tool = %call.function.name, "Unparseable tool call arguments: {}", e);
                        None
                    }
                },
            )
            .collect()
    }

    fn parse_finish_reason(reason: Option<&str>) -> FinishReason {
        match reason {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("tool_calls") => FinishReason::ToolCalls,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Error,
        }
    }

    fn classify_status(status: StatusCode, body: String) -> LlmError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                LlmError::AuthenticationFailed(format!("{status} - {body}"))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                LlmError::RateLimitExceeded(format!("{status} - {body}"))
            }
            s if s.is_server_error() => {
                LlmError::ApiError(format!("server error: {status} - {body}"))
            }
            _ => LlmError::ApiError(format!("{status} - {body}")),
        }
    }

    fn is_retryable(error: &LlmError) -> bool {
        match error {
            LlmError::NetworkError(_) => true,
            LlmError::ApiError(message) => message.starts_with("server error"),
            _ => false,
        }
    }

    async fn send_once(&self, request: &WireRequest) -> Result<WireResponse, LlmError> {
        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                LlmError::NetworkError(format!(
                    "{} (is_connect: {}, is_timeout: {})",
                    e,
                    e.is_connect(),
                    e.is_timeout()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, body));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }

    async fn send_with_retry(&self, request: &WireRequest) -> Result<WireResponse, LlmError> {
        let mut last_error = None;

        for attempt in 0..=RETRY_BACKOFF_MS.len() {
            if attempt > 0 {
                let delay = RETRY_BACKOFF_MS[attempt - 1];
                debug!(attempt, delay_ms = delay, "Retrying chat completion");
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.send_once(request).await {
                Ok(response) => return Ok(response),
                Err(e) if Self::is_retryable(&e) => {
                    warn!(attempt = attempt + 1, "Chat completion failed: {}", e);
                    last_error = Some(e);
                }
                Err(e) => {
                    error!("Non-retryable chat completion error: {}", e);
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::NetworkError("All retry attempts failed".to_string())))
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let wire_request = Self::to_wire_request(&request);
        debug!(
            model = %wire_request.model,
            messages = wire_request.messages.len(),
            tools = wire_request.tools.as_ref().map(Vec::len).unwrap_or(0),
            "Sending chat completion"
        );

        let response = Self::from_wire_response(self.send_with_retry(&wire_request).await?)?;

        debug!(
            total_tokens = response.usage.total_tokens,
            finish_reason = ?response.finish_reason,
            tool_calls = response.pending_tool_calls().len(),
            "Chat completion received"
        );
        Ok(response)
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        let response = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LlmError::AuthenticationFailed(format!(
                "Health check returned {}",
                response.status()
            )))
        }
    }
}

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: MessageRole,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: Some(message.content.clone()),
            tool_calls: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: WireFunction,
}

impl From<&ToolDescription> for WireTool {
    fn from(tool: &ToolDescription) -> Self {
        Self {
            tool_type: "function",
            function: WireFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    model: String,
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
