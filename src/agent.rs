//! Conversation orchestrator: alternates model calls and tool calls until the model answers.

use itertools::Itertools;
use nonempty::NonEmpty;
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::client::{Client, ClientError};
use crate::config::DEFAULT_MAX_ROUNDS;
use crate::model::{FinishReason, Message, Part, Transcript, Usage};
use crate::tools::{self, ToolError, ToolService};

/// Errors surfaced by [`Agent::process`].
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("No final answer after {0} model calls")]
    RoundLimit(usize),
}

/// Agent that resolves a query by looping between a model and a tool provider.
///
/// Each model response is scanned in order: text goes to the output, every tool
/// use adds a trace line and is queued. Queued calls are run one at a time, their
/// results are sent back as a single user turn, and the model is asked again.
/// The loop ends on the first response without tool uses, or fails once
/// `max_rounds` model calls have been made.
///
/// # Example
/// ```ignore
/// let client = Anthropic::create(api_key);
/// let server = tether::mcp::launch("weather.py").await?;
/// let agent = Agent::new(client, server);
///
/// println!("{}", agent.process("Any alerts in CA?").await?);
/// ```
pub struct Agent<C: Client, T: ToolService> {
    client: C,
    tools: T,
    max_rounds: usize,
}

struct ToolCall {
    id: String,
    name: String,
    input: Value,
}

enum State {
    AwaitingModel,
    DrainingToolCalls(NonEmpty<ToolCall>),
    Done,
}

impl<C: Client, T: ToolService> Agent<C, T> {
    pub fn new(client: C, tools: T) -> Self {
        Self {
            client,
            tools,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Set the maximum number of model calls per query.
    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max;
        self
    }

    /// Resolve `query` on a fresh transcript and return the newline-joined output.
    pub async fn process(&self, query: &str) -> Result<String, AgentError> {
        let mut transcript = Transcript::new();
        self.process_in(&mut transcript, query).await
    }

    /// Resolve `query` as a continuation of `transcript`.
    ///
    /// On failure the transcript is restored to exactly what it held before the call.
    pub async fn process_in(
        &self,
        transcript: &mut Transcript,
        query: &str,
    ) -> Result<String, AgentError> {
        let checkpoint = transcript.checkpoint();
        let span = info_span!("query", id = %Uuid::new_v4());

        let result = self.run(transcript, query).instrument(span).await;
        if result.is_err() {
            transcript.restore(checkpoint);
        }
        result
    }

    async fn run(&self, transcript: &mut Transcript, query: &str) -> Result<String, AgentError> {
        transcript.push(Message::User(vec![Part::text(query)]));

        let catalog = tools::catalog(self.tools.list_tools().await?);
        debug!(tools = catalog.len(), "Fetched tool catalog");

        let mut output: Vec<String> = Vec::new();
        let mut usage = Usage::default();
        let mut rounds = 0;
        let mut state = State::AwaitingModel;

        loop {
            state = match state {
                State::AwaitingModel => {
                    if rounds == self.max_rounds {
                        warn!("Round limit ({}) reached in agent loop", self.max_rounds);
                        return Err(AgentError::RoundLimit(self.max_rounds));
                    }
                    rounds += 1;
                    debug!("Agent round {}/{}", rounds, self.max_rounds);

                    let response = self
                        .client
                        .request(transcript.messages().to_vec(), catalog.clone())
                        .await?;
                    usage += response.usage;
                    if response.finish == FinishReason::OutputTokens {
                        warn!(
                            "Model response hit the output token limit ({} tokens); it may be incomplete",
                            response.usage.completion_tokens
                        );
                    }

                    let mut calls = Vec::new();
                    for part in &response.content {
                        match part {
                            Part::Text(text) => output.push(text.clone()),
                            Part::ToolUse { id, name, input } => {
                                output.push(format!(
                                    "[Calling tool {} with args {}]",
                                    name,
                                    Literal(input)
                                ));
                                calls.push(ToolCall {
                                    id: id.clone(),
                                    name: name.clone(),
                                    input: input.clone(),
                                });
                            }
                            Part::ToolResult { tool_use_id, .. } => {
                                warn!("Ignoring tool result {} in model response", tool_use_id);
                            }
                        }
                    }

                    if !response.content.is_empty() {
                        transcript.push(Message::Assistant(response.content));
                    }

                    match NonEmpty::from_vec(calls) {
                        Some(calls) => State::DrainingToolCalls(calls),
                        None => State::Done,
                    }
                }
                State::DrainingToolCalls(calls) => {
                    let mut results = Vec::with_capacity(calls.len());
                    for call in calls {
                        info!("Tool call requested: {}", call.name);
                        debug!("Tool arguments: {}", call.input);

                        let result = self.tools.call_tool(call.name.clone(), call.input).await?;
                        if result.is_error {
                            warn!("Tool {} reported an error", call.name);
                        }

                        results.push(Part::ToolResult {
                            tool_use_id: call.id,
                            output: result,
                        });
                    }
                    transcript.push(Message::User(results));
                    State::AwaitingModel
                }
                State::Done => {
                    debug!(
                        rounds,
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        "Agent loop complete"
                    );
                    return Ok(output.iter().join("\n"));
                }
            };
        }
    }
}

/// Renders tool arguments as a dict-style literal: `{'lat': 40.7, 'ok': True}`.
struct Literal<'a>(&'a Value);

impl fmt::Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Null => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Number(n) => match n.as_f64() {
                Some(x) if n.is_f64() => write_float(f, x),
                _ => write!(f, "{}", n),
            },
            Value::String(s) => write_quoted(f, s),
            Value::Array(items) => {
                write!(f, "[{}]", items.iter().map(Literal).format(", "))
            }
            Value::Object(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_quoted(f, key)?;
                    write!(f, ": {}", Literal(value))?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Shortest round-trip digits; scientific outside `1e-4 <= |x| < 1e16`, with a
/// signed two-digit exponent (`1e+20`, `1.5e-07`).
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    let sci = format!("{:e}", x);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or_default();

    if (-4..16).contains(&exp) {
        let plain = x.to_string();
        if plain.contains('.') {
            f.write_str(&plain)
        } else {
            write!(f, "{}.0", plain)
        }
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        write!(f, "{}e{}{:02}", mantissa, sign, exp.abs())
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    write!(f, "{}", quote)?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => write!(f, "\\{}", c)?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "{}", quote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_dict_literals() {
        let args = json!({"lat": 40.7, "lon": -74.0});
        assert_eq!(Literal(&args).to_string(), "{'lat': 40.7, 'lon': -74.0}");

        let args = json!({"state": "CA", "flags": [true, null, 3]});
        assert_eq!(
            Literal(&args).to_string(),
            "{'state': 'CA', 'flags': [True, None, 3]}"
        );
    }

    #[test]
    fn quotes_like_a_literal() {
        assert_eq!(Literal(&json!("it's")).to_string(), "\"it's\"");
        assert_eq!(Literal(&json!("a\nb")).to_string(), "'a\\nb'");
        assert_eq!(Literal(&json!({})).to_string(), "{}");
    }

    #[test]
    fn renders_floats_like_repr() {
        let render = |v: Value| Literal(&v).to_string();
        assert_eq!(render(json!(1e20)), "1e+20");
        assert_eq!(render(json!(1.5e-7)), "1.5e-07");
        assert_eq!(render(json!(1e16)), "1e+16");
        assert_eq!(render(json!(1e15)), "1000000000000000.0");
        assert_eq!(render(json!(0.0001)), "0.0001");
        assert_eq!(render(json!(72.0)), "72.0");
        assert_eq!(render(json!(-74.25)), "-74.25");
        assert_eq!(render(json!(100)), "100");
    }
}
