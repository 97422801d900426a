//! Integration tests for the OpenAI-compatible provider
//!
//! Tests behavioral contracts against a mock HTTP server:
//! - Request/response handling
//! - Error scenarios (auth failures, rate limits, malformed bodies)
//! - Retry on server errors
//! - Tool call decoding

use query_router::llm::provider::{
    CompletionRequest, FinishReason, LlmError, LlmProvider, Message, TokenUsage,
};
use query_router::llm::providers::openai::{OpenAiConfig, OpenAiProvider};
use query_router::tools::ToolDescription;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> OpenAiConfig {
    OpenAiConfig {
        api_key: "test-api-key".to_string(),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
    }
}

fn test_request(model: &str) -> CompletionRequest {
    CompletionRequest {
        model: model.to_string(),
        messages: vec![Message::user("Hello")],
        max_tokens: Some(100),
        temperature: Some(0.5),
        tools: None,
    }
}

fn completion_body(content: &str, finish_reason: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": finish_reason
            }
        ],
        "usage": {"prompt_tokens": 10, "completion_tokens": 15, "total_tokens": 25}
    })
}

#[tokio::test]
async fn test_returns_successful_completion() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-api-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "Hello"}],
            "temperature": 0.5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hi there", "stop")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let response = provider.complete(test_request("gpt-4o-mini")).await.unwrap();

    assert_eq!(response.content.as_deref(), Some("Hi there"));
    assert_eq!(response.model, "gpt-4o-mini");
    assert_eq!(response.finish_reason, FinishReason::Stop);
    assert_eq!(
        response.usage,
        TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 15,
            total_tokens: 25
        }
    );
    assert!(response.pending_tool_calls().is_empty());
}

#[tokio::test]
async fn test_trailing_slash_in_base_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok", "stop")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&format!("{}/", mock_server.uri()))).unwrap();
    assert!(provider.complete(test_request("m")).await.is_ok());
}

#[tokio::test]
async fn test_sends_tools_and_decodes_tool_calls() {
    let mock_server = MockServer::start().await;

    let response_body = json!({
        "model": "gpt-4o-mini",
        "choices": [
            {
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {
                            "id": "call_abc",
                            "type": "function",
                            "function": {
                                "name": "web_search",
                                "arguments": "{\"query\": \"refund policy\"}"
                            }
                        },
                        {
                            "id": "call_bad",
                            "type": "function",
                            "function": {"name": "web_search", "arguments": "{not json"}
                        }
                    ]
                },
                "finish_reason": "tool_calls"
            }
        ]
    });

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "tools": [{"type": "function", "function": {"name": "web_search"}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut request = test_request("gpt-4o-mini");
    request.tools = Some(vec![ToolDescription {
        name: "web_search".to_string(),
        description: "Search the web".to_string(),
        parameters: json!({"type": "object", "properties": {"query": {"type": "string"}}}),
    }]);

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let response = provider.complete(request).await.unwrap();

    assert_eq!(response.finish_reason, FinishReason::ToolCalls);
    assert_eq!(response.content, None);
    // Undecodable arguments are dropped, the rest survive
    let calls = response.pending_tool_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, "call_abc");
    assert_eq!(calls[0].arguments, json!({"query": "refund policy"}));
    // Missing usage reads as zero
    assert_eq!(response.usage, TokenUsage::default());
}

#[tokio::test]
async fn test_401_is_authentication_failure_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(test_request("m")).await;

    assert!(matches!(result, Err(LlmError::AuthenticationFailed(_))));
}

#[tokio::test]
async fn test_429_is_rate_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(test_request("m")).await;

    match result {
        Err(LlmError::RateLimitExceeded(message)) => assert!(message.contains("slow down")),
        other => panic!("Expected RateLimitExceeded, got {other:?}"),
    }
}

#[tokio::test]
async fn test_retries_on_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service temporarily unavailable"))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body("Success after retry", "stop")),
        )
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let response = provider.complete(test_request("m")).await.unwrap();

    assert_eq!(response.content.as_deref(), Some("Success after retry"));
}

#[tokio::test]
async fn test_fails_after_all_retries_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(4)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(test_request("m")).await;

    match result {
        Err(LlmError::ApiError(message)) => assert!(message.starts_with("server error")),
        other => panic!("Expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_choices_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"model": "m", "choices": []})))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(test_request("m")).await;

    assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(test_request("m")).await;

    assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_length_and_content_filter_finish_reasons() {
    for (wire, expected) in [
        ("length", FinishReason::Length),
        ("content_filter", FinishReason::ContentFilter),
        ("something_new", FinishReason::Error),
    ] {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("x", wire)))
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
        let response = provider.complete(test_request("m")).await.unwrap();
        assert_eq!(response.finish_reason, expected, "Failed for finish_reason: {wire}");
    }
}

#[tokio::test]
async fn test_health_check() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("Authorization", "Bearer test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    assert!(provider.health_check().await.is_ok());

    let unauthorized = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&unauthorized)
        .await;

    let provider = OpenAiProvider::new(test_config(&unauthorized.uri())).unwrap();
    assert!(matches!(
        provider.health_check().await,
        Err(LlmError::AuthenticationFailed(_))
    ));
}

#[test]
fn test_empty_api_key_is_not_configured() {
    let mut config = test_config("http://localhost");
    config.api_key = String::new();

    assert!(matches!(
        OpenAiProvider::new(config),
        Err(LlmError::NotConfigured(_))
    ));
}
