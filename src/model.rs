//! Provider-agnostic conversation model: turns, content blocks and model responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::{Add, AddAssign};

use crate::tools::ToolOutput;

/// Role of a turn in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single content block inside a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    /// Free-form text.
    Text(String),
    /// A request from the model to invoke a tool.
    ///
    /// `id` is generated by the model provider and must come back unchanged
    /// in the matching [`Part::ToolResult`].
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    /// The outcome of a tool invocation, keyed by the originating tool use id.
    ToolResult {
        tool_use_id: String,
        output: ToolOutput,
    },
}

impl Part {
    pub fn text(content: impl Into<String>) -> Self {
        Part::Text(content.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    User(Vec<Part>),
    Assistant(Vec<Part>),
}

impl Message {
    pub fn role(&self) -> Role {
        match self {
            Message::User(_) => Role::User,
            Message::Assistant(_) => Role::Assistant,
        }
    }

    pub fn parts(&self) -> &[Part] {
        match self {
            Message::User(parts) | Message::Assistant(parts) => parts,
        }
    }

    pub fn parts_mut(&mut self) -> &mut Vec<Part> {
        match self {
            Message::User(parts) | Message::Assistant(parts) => parts,
        }
    }

    pub fn into_parts(self) -> Vec<Part> {
        match self {
            Message::User(parts) | Message::Assistant(parts) => parts,
        }
    }

    /// Concatenated text of all text parts, if there are any.
    pub fn content(&self) -> Option<String> {
        let texts: Vec<&str> = self.parts().iter().filter_map(Part::as_text).collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

/// Ordered conversation history exchanged with the model provider.
///
/// Turns always alternate in role. Pushing a turn whose role matches the last
/// turn appends its parts to that turn instead of opening a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        match self.messages.last_mut() {
            Some(last) if last.role() == message.role() => {
                last.parts_mut().extend(message.into_parts());
            }
            _ => self.messages.push(message),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Mark the current end of the transcript, including the size of the last turn.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            turns: self.messages.len(),
            parts: self.messages.last().map_or(0, |m| m.parts().len()),
        }
    }

    /// Undo every push made since `checkpoint`, merged parts included.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.messages.truncate(checkpoint.turns);
        if let Some(last) = self.messages.last_mut() {
            last.parts_mut().truncate(checkpoint.parts);
        }
    }
}

/// Position in a [`Transcript`] to roll back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    turns: usize,
    parts: usize,
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        let mut transcript = Transcript::new();
        for message in messages {
            transcript.push(message);
        }
        transcript
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    ToolUse,
    OutputTokens,
    Other(String),
}

/// Token accounting for one or more model calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Add for Usage {
    type Output = Usage;

    fn add(self, rhs: Usage) -> Usage {
        Usage {
            prompt_tokens: self.prompt_tokens + rhs.prompt_tokens,
            completion_tokens: self.completion_tokens + rhs.completion_tokens,
        }
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, rhs: Usage) {
        *self = *self + rhs;
    }
}

/// Result of a single model call: the ordered content blocks of one assistant turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub content: Vec<Part>,
    pub usage: Usage,
    pub finish: FinishReason,
}

impl Response {
    /// A plain text response, mostly useful for stubs.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![Part::text(content)],
            usage: Usage::default(),
            finish: FinishReason::Stop,
        }
    }
}
