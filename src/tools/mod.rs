//! Tool system used by the agentic search loop
//!
//! Tools describe themselves with a JSON Schema so the model can call them, and
//! every call is validated against that schema before it runs.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

pub mod builtin;

/// A callable tool exposed to the model
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and JSON Schema of the parameters
    fn describe(&self) -> ToolDescription;

    /// Run the tool with parameters that already passed schema validation
    async fn execute(&self, parameters: &Value) -> Result<Value, ToolError>;
}

/// Tool description handed to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescription {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Registry of tools available to one searcher
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under the name it describes itself with
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(tool.describe().name, tool);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn list_tools(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Descriptions of every registered tool, in name order
    pub fn descriptions(&self) -> Vec<ToolDescription> {
        self.tools.values().map(|tool| tool.describe()).collect()
    }

    /// Validate `parameters` against the tool's schema, then run it
    pub async fn execute_tool(&self, tool_name: &str, parameters: &Value) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| ToolError::UnknownTool(tool_name.to_string()))?;

        validate_parameters(&tool.describe(), parameters)?;
        tool.execute(parameters).await
    }
}

fn validate_parameters(description: &ToolDescription, parameters: &Value) -> Result<(), ToolError> {
    let validator = jsonschema::validator_for(&description.parameters)
        .map_err(|e| ToolError::SchemaError(format!("Schema compilation error: {e}")))?;

    validator.validate(parameters).map_err(|errors| {
        let messages: Vec<String> = errors
            .map(|e| format!("At '{}': {}", e.instance_path, e))
            .collect();
        ToolError::ValidationError(messages.join("; "))
    })
}

/// Tool system errors
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Tool initialization failed: {0}")]
    InitializationError(String),
    #[error("Parameter validation failed: {0}")]
    ValidationError(String),
    #[error("Schema error: {0}")]
    SchemaError(String),
    #[error("Tool execution failed: {0}")]
    ExecutionError(String),
}
