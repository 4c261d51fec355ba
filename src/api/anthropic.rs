//! Anthropic Messages API client implementation.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use tracing::warn;

use crate::client::{Client, ClientError};
use crate::http::{add_extra_headers, build_http_client, RequestBuilderExt, ResponseExt};
use crate::model::{FinishReason, Message, Part, Response, Role, Usage};
use crate::options::{ModelOptions, TransportOptions};
use crate::tools::{ToolContent, ToolDescriptor, ToolOutput};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Public Anthropic API endpoint.
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic model options.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnthropicModel {
    pub top_k: Option<u32>,
    pub metadata: Option<Value>,
}

/// Anthropic client.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    api_key: String,
    base_url: String,
    model_options: ModelOptions<AnthropicModel>,
    transport_options: TransportOptions,
}

impl AnthropicClient {
    pub fn new(
        api_key: String,
        base_url: String,
        model_options: ModelOptions<AnthropicModel>,
        transport_options: TransportOptions,
    ) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_options,
            transport_options,
        }
    }

    fn handle_error_response(status: reqwest::StatusCode, body: &str) -> ClientError {
        if let Ok(error_resp) = serde_json::from_str::<AnthropicErrorResponse>(body) {
            ClientError::ProviderError(format!(
                "Anthropic error ({}): {}",
                error_resp.error.error_type, error_resp.error.message
            ))
        } else {
            ClientError::ProviderError(format!("HTTP {}: {}", status, body))
        }
    }
}

#[async_trait]
impl Client for AnthropicClient {
    type ModelProvider = AnthropicModel;

    async fn request(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDescriptor>,
    ) -> Result<Response, ClientError> {
        let url = format!("{}/messages", self.base_url);
        let request_body = AnthropicRequest::new(&messages, &self.model_options, tools);

        let http_client = build_http_client(&self.transport_options)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|_| ClientError::Config("Invalid API key".to_string()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let req = http_client.post(&url).headers(headers);
        let req = add_extra_headers(req, &self.transport_options);

        let response = req.json_logged(&request_body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text_logged().await.unwrap_or_default();
            return Err(Self::handle_error_response(status, &body));
        }

        let anthropic_response: AnthropicResponse = response.json_logged().await?;
        Ok(anthropic_response.into())
    }

    fn model_options(&self) -> &ModelOptions<Self::ModelProvider> {
        &self.model_options
    }

    fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }
}

// --- Request Types ---

#[skip_serializing_none]
#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
    system: Option<&'a str>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDescriptor>,
    #[serde(flatten)]
    provider_options: &'a AnthropicModel,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: Role,
    content: Vec<OutboundBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutboundBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: Vec<ResultBlock>,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResultBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: String,
    data: String,
}

impl From<&ToolContent> for ResultBlock {
    fn from(content: &ToolContent) -> Self {
        match content {
            ToolContent::Text(text) => ResultBlock::Text { text: text.clone() },
            ToolContent::Image { data, mime_type } => ResultBlock::Image {
                source: ImageSource {
                    source_type: "base64",
                    media_type: mime_type.clone(),
                    data: data.clone(),
                },
            },
        }
    }
}

impl From<&Part> for OutboundBlock {
    fn from(part: &Part) -> Self {
        match part {
            Part::Text(text) => OutboundBlock::Text { text: text.clone() },
            Part::ToolUse { id, name, input } => OutboundBlock::ToolUse {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            },
            Part::ToolResult {
                tool_use_id,
                output: ToolOutput { content, is_error },
            } => OutboundBlock::ToolResult {
                tool_use_id: tool_use_id.clone(),
                content: content.iter().map(ResultBlock::from).collect(),
                is_error: *is_error,
            },
        }
    }
}

impl<'a> AnthropicRequest<'a> {
    fn new(
        messages_in: &[Message],
        model_options: &'a ModelOptions<AnthropicModel>,
        tools: Vec<ToolDescriptor>,
    ) -> Self {
        let messages = messages_in
            .iter()
            .map(|msg| AnthropicMessage {
                role: msg.role(),
                content: msg.parts().iter().map(OutboundBlock::from).collect(),
            })
            .collect();

        AnthropicRequest {
            model: &model_options.model,
            max_tokens: model_options.max_tokens,
            messages,
            system: model_options.system.as_deref(),
            temperature: model_options.temperature,
            top_p: model_options.top_p,
            tools,
            provider_options: &model_options.provider,
        }
    }
}

// --- Response Types ---

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<InboundBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InboundBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicError,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

impl From<AnthropicResponse> for Response {
    fn from(resp: AnthropicResponse) -> Self {
        let content = resp
            .content
            .into_iter()
            .filter_map(|block| match block {
                InboundBlock::Text { text } => Some(Part::Text(text)),
                InboundBlock::ToolUse { id, name, input } => Some(Part::ToolUse { id, name, input }),
                InboundBlock::Unsupported => {
                    warn!("Skipping unsupported content block in Anthropic response");
                    None
                }
            })
            .collect();

        let finish = match resp.stop_reason.as_deref() {
            Some("end_turn") | Some("stop_sequence") | None => FinishReason::Stop,
            Some("tool_use") => FinishReason::ToolUse,
            Some("max_tokens") => FinishReason::OutputTokens,
            Some(other) => FinishReason::Other(other.to_string()),
        };

        Response {
            content,
            usage: Usage {
                prompt_tokens: resp.usage.input_tokens,
                completion_tokens: resp.usage.output_tokens,
            },
            finish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_tool_round_trip_transcript() {
        let options = ModelOptions::<AnthropicModel>::default();
        let messages = vec![
            Message::User(vec![Part::text("weather?")]),
            Message::Assistant(vec![
                Part::text("Checking."),
                Part::ToolUse {
                    id: "toolu_1".into(),
                    name: "get_alerts".into(),
                    input: json!({"state": "CA"}),
                },
            ]),
            Message::User(vec![Part::ToolResult {
                tool_use_id: "toolu_1".into(),
                output: ToolOutput::text("No active alerts for this state."),
            }]),
        ];
        let tools = vec![ToolDescriptor {
            name: "get_alerts".into(),
            description: Some("Get weather alerts for a US state.".into()),
            input_schema: json!({"type": "object"}),
        }];

        let body = serde_json::to_value(AnthropicRequest::new(&messages, &options, tools)).unwrap();

        assert_eq!(body["model"], "claude-3-5-sonnet-20241022");
        assert_eq!(body["max_tokens"], 1000);
        assert!(body.get("system").is_none());
        assert!(body.get("top_k").is_none());
        assert_eq!(body["tools"][0]["name"], "get_alerts");
        assert_eq!(
            body["messages"][1]["content"][1],
            json!({"type": "tool_use", "id": "toolu_1", "name": "get_alerts", "input": {"state": "CA"}})
        );
        assert_eq!(
            body["messages"][2],
            json!({
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": "toolu_1",
                    "content": [{"type": "text", "text": "No active alerts for this state."}]
                }]
            })
        );
    }

    #[test]
    fn marks_failed_tool_results() {
        let part = Part::ToolResult {
            tool_use_id: "toolu_2".into(),
            output: ToolOutput::error("bad state"),
        };
        let block = serde_json::to_value(OutboundBlock::from(&part)).unwrap();
        assert_eq!(block["is_error"], true);
    }

    #[test]
    fn parses_mixed_response() {
        let raw = json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-5-sonnet-20241022",
            "content": [
                {"type": "text", "text": "Let me look."},
                {"type": "tool_use", "id": "toolu_9", "name": "get_forecast", "input": {"latitude": 40.7, "longitude": -74.0}},
                {"type": "thinking", "thinking": "..."}
            ],
            "stop_reason": "tool_use",
            "stop_sequence": null,
            "usage": {"input_tokens": 12, "output_tokens": 34}
        });

        let parsed: AnthropicResponse = serde_json::from_value(raw).unwrap();
        let response = Response::from(parsed);

        assert_eq!(response.finish, FinishReason::ToolUse);
        assert_eq!(response.usage.completion_tokens, 34);
        assert_eq!(response.content.len(), 2);
        assert_eq!(response.content[0], Part::text("Let me look."));
        assert!(matches!(&response.content[1], Part::ToolUse { name, .. } if name == "get_forecast"));
    }

    #[test]
    fn formats_provider_errors() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let err = AnthropicClient::handle_error_response(reqwest::StatusCode::SERVICE_UNAVAILABLE, body);
        assert_eq!(err.to_string(), "Provider error: Anthropic error (overloaded_error): Overloaded");
    }
}
