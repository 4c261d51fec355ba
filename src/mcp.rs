//! MCP client side: launching a tool server over stdio and adapting it to [`ToolService`].

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParam, CallToolResult, RawContent, ResourceContents, Tool};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::TokioChildProcess;
use rmcp::{ClientHandler, ServiceExt};
use serde_json::Value;
use std::ops::Deref;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::tools::{ToolContent, ToolError, ToolOutput, ToolService};

/// A connected MCP server backed by a child process.
pub type McpConnection = RunningService<RoleClient, ()>;

/// Build the command that starts the server at `script`.
///
/// `.py` scripts run under `python`, `.js` under `node`; any other existing file
/// is executed directly. The child inherits this process's environment.
pub fn server_command(script: &Path) -> Result<Command, ToolError> {
    let command = match script.extension().and_then(|ext| ext.to_str()) {
        Some("py") => {
            let mut cmd = Command::new("python");
            cmd.arg(script);
            cmd
        }
        Some("js") => {
            let mut cmd = Command::new("node");
            cmd.arg(script);
            cmd
        }
        _ if script.is_file() => Command::new(script),
        _ => return Err(ToolError::UnsupportedScript(script.display().to_string())),
    };
    Ok(command)
}

/// Spawn the server at `script` and complete the MCP initialize handshake.
pub async fn launch(script: impl AsRef<Path>) -> Result<McpConnection, ToolError> {
    let script = script.as_ref();
    let command = server_command(script)?;

    info!(script = %script.display(), "Launching MCP server");
    let transport = TokioChildProcess::new(command).map_err(|e| ToolError::Launch(e.to_string()))?;

    let service = ()
        .serve(transport)
        .await
        .map_err(|e| ToolError::Launch(e.to_string()))?;

    if let Some(peer) = service.peer_info() {
        info!(
            server = %peer.server_info.name,
            version = %peer.server_info.version,
            "MCP server initialized"
        );
    }

    Ok(service)
}

#[async_trait]
impl<S: ClientHandler + Send + Sync> ToolService for RunningService<RoleClient, S> {
    async fn list_tools(&self) -> Result<Vec<Tool>, ToolError> {
        let tools = self
            .deref()
            .list_all_tools()
            .await
            .map_err(|e| ToolError::Mcp(e.to_string()))?;
        debug!(count = tools.len(), "Listed MCP tools");
        Ok(tools)
    }

    async fn call_tool(&self, name: String, args: Value) -> Result<ToolOutput, ToolError> {
        let params = CallToolRequestParam {
            name: name.into(),
            arguments: args.as_object().cloned(),
        };

        let result = self
            .deref()
            .call_tool(params)
            .await
            .map_err(|e| ToolError::Mcp(e.to_string()))?;

        Ok(result.into())
    }
}

impl From<CallToolResult> for ToolOutput {
    fn from(result: CallToolResult) -> Self {
        let mut content = Vec::new();

        for item in result.content {
            match item.raw {
                RawContent::Text(text) => content.push(ToolContent::Text(text.text)),
                RawContent::Image(image) => content.push(ToolContent::Image {
                    data: image.data,
                    mime_type: image.mime_type,
                }),
                RawContent::Resource(resource) => match resource.resource {
                    ResourceContents::TextResourceContents { text, .. } => {
                        content.push(ToolContent::Text(text))
                    }
                    ResourceContents::BlobResourceContents { uri, .. } => {
                        warn!("Blob resource {} in tool result not supported, skipping", uri);
                    }
                },
                other => warn!("Unsupported tool result content, skipping: {:?}", other),
            }
        }

        if content.is_empty() {
            if let Some(structured) = result.structured_content {
                content.push(ToolContent::Text(structured.to_string()));
            }
        }

        ToolOutput {
            content,
            is_error: result.is_error.unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::Content;
    use serde_json::json;

    #[test]
    fn picks_interpreter_from_extension() {
        let cmd = server_command(Path::new("weather.py")).unwrap();
        assert_eq!(cmd.as_std().get_program(), "python");
        let args: Vec<_> = cmd.as_std().get_args().collect();
        assert_eq!(args, vec!["weather.py"]);

        let cmd = server_command(Path::new("build/index.js")).unwrap();
        assert_eq!(cmd.as_std().get_program(), "node");
    }

    #[test]
    fn rejects_missing_non_script() {
        let err = server_command(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, ToolError::UnsupportedScript(_)));
    }

    #[test]
    fn converts_text_and_error_flag() {
        let result = CallToolResult::error(vec![Content::text("boom")]);
        let output = ToolOutput::from(result);
        assert!(output.is_error);
        assert_eq!(output.content, vec![ToolContent::Text("boom".into())]);
    }

    #[test]
    fn falls_back_to_structured_content() {
        let result = CallToolResult::structured(json!({"temp": 72}));
        let output = ToolOutput::from(result);
        assert!(!output.is_error);
        assert_eq!(output.content.len(), 1);
    }
}
