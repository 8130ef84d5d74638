//! Conversation types.
//!
//! A conversation is an append-only sequence of [`Turn`]s replayed to the
//! model on every round. Tool results use the single [`Role::Tool`] tag;
//! the backend decides how that maps onto its wire format.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A unique identifier for a conversation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a conversation participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Tool results fed back to the model.
    Tool,
}

/// A tool invocation requested by the model, normalized to plain values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// What a dispatched tool call produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomePayload {
    /// Ordered text blocks returned by the tool.
    Content(Vec<String>),
    /// Human-readable failure message.
    Error(String),
}

/// Result of one tool call, paired with the tool's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallOutcome {
    pub tool_name: String,
    pub payload: OutcomePayload,
}

impl ToolCallOutcome {
    /// Create a successful outcome.
    pub fn content(tool_name: impl Into<String>, blocks: Vec<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            payload: OutcomePayload::Content(blocks),
        }
    }

    /// Create a failed outcome.
    pub fn error(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            payload: OutcomePayload::Error(message.into()),
        }
    }

    /// Whether this outcome is a failure.
    pub fn is_error(&self) -> bool {
        matches!(self.payload, OutcomePayload::Error(_))
    }
}

/// A part of a turn's content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Plain text content.
    Text { text: String },
    /// Tool result fed back to the model.
    ToolResult(ToolCallOutcome),
}

impl Part {
    /// Create a text part.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text { text: s.into() }
    }
}

/// One turn in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    /// Create a user turn with text.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
        }
    }

    /// Create an assistant turn with text.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            parts: vec![Part::text(text)],
        }
    }

    /// Create a tool turn carrying a batch of results.
    pub fn tool_results(outcomes: Vec<ToolCallOutcome>) -> Self {
        Self {
            role: Role::Tool,
            parts: outcomes.into_iter().map(Part::ToolResult).collect(),
        }
    }

    /// Get combined text content.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Extract tool outcomes carried by this turn.
    pub fn tool_outcomes(&self) -> Vec<&ToolCallOutcome> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::ToolResult(outcome) => Some(outcome),
                _ => None,
            })
            .collect()
    }
}

/// Conversation history for one session.
///
/// Held by the caller and passed into each `answer()` run, so nothing is
/// shared across sessions.
#[derive(Debug, Clone, Default)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_text_extraction() {
        let turn = Turn {
            role: Role::Assistant,
            parts: vec![
                Part::text("Hello "),
                Part::ToolResult(ToolCallOutcome::content("read_sheet", vec![])),
                Part::text("world"),
            ],
        };
        assert_eq!(turn.text(), "Hello world");
    }

    #[test]
    fn tool_turn_carries_outcomes_in_order() {
        let turn = Turn::tool_results(vec![
            ToolCallOutcome::content("read_sheet", vec!["[]".to_string()]),
            ToolCallOutcome::error("write_cell", "row out of range"),
        ]);
        assert_eq!(turn.role, Role::Tool);
        let outcomes = turn.tool_outcomes();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].tool_name, "read_sheet");
        assert!(outcomes[1].is_error());
    }

    #[test]
    fn history_is_append_only_ordered() {
        let mut history = History::new();
        history.push(Turn::user("hi"));
        history.push(Turn::assistant("hello"));
        assert_eq!(history.len(), 2);
        assert_eq!(history.turns()[0].role, Role::User);
        assert_eq!(history.turns()[1].role, Role::Assistant);
    }
}
