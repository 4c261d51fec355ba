//! Tool provider seam: catalog entries, invocation results and the trait the agent calls through.

use async_trait::async_trait;
pub use rmcp::model::Tool;
use serde::Serialize;
use serde_json::Value;

/// Error type for tool providers.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Failed to launch tool server: {0}")]
    Launch(String),

    #[error("MCP error: {0}")]
    Mcp(String),

    #[error("Unsupported server script: {0} (expected a .py or .js file, or an executable)")]
    UnsupportedScript(String),
}

/// A tool as the model provider sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: Value,
}

impl From<Tool> for ToolDescriptor {
    fn from(tool: Tool) -> Self {
        Self {
            name: tool.name.into_owned(),
            description: tool.description.map(|d| d.into_owned()),
            input_schema: Value::Object((*tool.input_schema).clone()),
        }
    }
}

/// Convert a provider listing into model-facing descriptors, keeping order.
pub fn catalog(tools: Vec<Tool>) -> Vec<ToolDescriptor> {
    tools.into_iter().map(ToolDescriptor::from).collect()
}

/// One piece of tool output.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolContent {
    Text(String),
    Image { data: String, mime_type: String },
}

/// Payload returned by a tool invocation.
///
/// `is_error` marks failures the tool reported in-band; they are handed back to
/// the model rather than aborting the conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    pub content: Vec<ToolContent>,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text(text.into())],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text(text.into())],
            is_error: true,
        }
    }
}

/// Trait for anything that can list and execute tools on the model's behalf.
#[async_trait]
pub trait ToolService: Send + Sync {
    /// List available tools.
    async fn list_tools(&self) -> Result<Vec<Tool>, ToolError>;

    /// Execute a tool.
    async fn call_tool(&self, name: String, args: Value) -> Result<ToolOutput, ToolError>;
}

#[async_trait]
impl<'a, T: ToolService + ?Sized> ToolService for &'a T {
    async fn list_tools(&self) -> Result<Vec<Tool>, ToolError> {
        (**self).list_tools().await
    }

    async fn call_tool(&self, name: String, args: Value) -> Result<ToolOutput, ToolError> {
        (**self).call_tool(name, args).await
    }
}
