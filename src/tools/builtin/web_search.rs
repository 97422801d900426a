//! Web search tool implementation
//!
//! Searches the web through the Tavily API and returns a compact list of
//! results the model can read.

use crate::tools::{Tool, ToolDescription, ToolError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

/// Web search tool configuration
#[derive(Debug, Clone)]
pub struct WebSearchConfig {
    pub api_key: String,
    pub base_url: String,
    pub max_results: usize,
    pub timeout: Duration,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.tavily.com".to_string(),
            max_results: 5,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Web search tool backed by Tavily
pub struct WebSearchTool {
    client: reqwest::Client,
    config: WebSearchConfig,
}

impl WebSearchTool {
    pub fn new(config: WebSearchConfig) -> Result<Self, ToolError> {
        if config.api_key.is_empty() {
            return Err(ToolError::InitializationError(
                "Search API key is required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ToolError::InitializationError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Build search payload (pure function)
    fn build_search_payload(api_key: &str, query: &str, max_results: usize) -> Value {
        json!({
            "api_key": api_key,
            "query": query,
            "max_results": max_results,
            "include_answer": true
        })
    }

    /// Keep only the fields the model needs (pure function)
    fn format_search_response(query: &str, search_result: &Value, max_results: usize) -> Value {
        let results: Vec<Value> = search_result
            .get("results")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let url = item.get("url").and_then(Value::as_str)?;
                        Some(json!({
                            "title": item.get("title").and_then(Value::as_str).unwrap_or(""),
                            "url": url,
                            "content": item.get("content").and_then(Value::as_str).unwrap_or(""),
                        }))
                    })
                    .take(max_results)
                    .collect()
            })
            .unwrap_or_default();

        let mut response = json!({
            "query": query,
            "results": results,
        });
        if let Some(answer) = search_result.get("answer").and_then(Value::as_str) {
            response["answer"] = json!(answer);
        }
        response
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn describe(&self) -> ToolDescription {
        ToolDescription {
            name: "web_search".to_string(),
            description: "Search the web for current information".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        }
    }

    async fn execute(&self, parameters: &Value) -> Result<Value, ToolError> {
        let query = parameters
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::ExecutionError("Query parameter is required".to_string()))?;

        let payload =
            Self::build_search_payload(&self.config.api_key, query, self.config.max_results);

        let response = self
            .client
            .post(format!(
                "{}/search",
                self.config.base_url.trim_end_matches('/')
            ))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ToolError::ExecutionError(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ToolError::ExecutionError(format!(
                "Search API error ({}): {}",
                status.as_u16(),
                error_text
            )));
        }

        let search_result: Value = response
            .json()
            .await
            .map_err(|e| ToolError::ExecutionError(format!("Failed to parse response: {e}")))?;

        Ok(Self::format_search_response(
            query,
            &search_result,
            self.config.max_results,
        ))
    }
}
