// ABOUTME: Defines the role-tagged chat message variants exchanged between human, model, and tools.
// ABOUTME: A delegating model reply is its own variant so routing pattern-matches instead of probing a field.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

/// A single delegation request attached to a model reply: the tool to run
/// plus its argument payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    pub name: String,
    pub arguments: Value,
}

impl ToolCall {
    /// Create a tool call with a fresh ULID call id.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            call_id: Ulid::new().to_string(),
            name: name.into(),
            arguments,
        }
    }

    /// Create a tool call with a provider-assigned call id.
    pub fn with_id(
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: Value,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// A role-tagged unit of conversation content. Immutable once appended.
///
/// A model reply that requests delegation is a distinct variant
/// (`AiToolRequest`) rather than a plain reply with an optional field,
/// so every consumer that cares about the distinction matches on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatMessage {
    /// Input from the human user.
    Human { content: String },

    /// A plain model reply requesting no delegation.
    Ai { content: String },

    /// A model reply carrying one or more tool invocation requests.
    AiToolRequest {
        content: String,
        tool_calls: Vec<ToolCall>,
    },

    /// The result of a delegated tool invocation, echoing the call it answers.
    Tool {
        content: String,
        call_id: String,
        name: String,
    },
}

impl ChatMessage {
    pub fn human(content: impl Into<String>) -> Self {
        Self::Human {
            content: content.into(),
        }
    }

    /// Build a model reply. An empty tool-call list collapses to the plain
    /// `Ai` variant, so `AiToolRequest` is non-empty by construction.
    pub fn ai(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        let content = content.into();
        if tool_calls.is_empty() {
            Self::Ai { content }
        } else {
            Self::AiToolRequest {
                content,
                tool_calls,
            }
        }
    }

    /// Build the result message for a completed tool call.
    pub fn tool_result(call: &ToolCall, content: impl Into<String>) -> Self {
        Self::Tool {
            content: content.into(),
            call_id: call.call_id.clone(),
            name: call.name.clone(),
        }
    }

    /// The textual content of the message, whatever its role.
    pub fn content(&self) -> &str {
        match self {
            Self::Human { content }
            | Self::Ai { content }
            | Self::AiToolRequest { content, .. }
            | Self::Tool { content, .. } => content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ai_constructor_collapses_empty_tool_calls() {
        let msg = ChatMessage::ai("plain reply", vec![]);
        assert!(matches!(msg, ChatMessage::Ai { .. }));

        let call = ToolCall::new("coding_tool", json!({"code_instructions": "fizzbuzz"}));
        let msg = ChatMessage::ai("delegating", vec![call]);
        assert!(matches!(msg, ChatMessage::AiToolRequest { .. }));
    }

    #[test]
    fn tool_result_echoes_call_identity() {
        let call = ToolCall::with_id("call-1", "coding_tool", json!({}));
        let msg = ChatMessage::tool_result(&call, "def f(): pass");

        match msg {
            ChatMessage::Tool {
                content,
                call_id,
                name,
            } => {
                assert_eq!(content, "def f(): pass");
                assert_eq!(call_id, "call-1");
                assert_eq!(name, "coding_tool");
            }
            other => panic!("expected Tool, got {:?}", other),
        }
    }

    #[test]
    fn messages_serialize_with_type_tag() {
        let json = serde_json::to_value(ChatMessage::human("hi")).unwrap();
        assert_eq!(json["type"], "human");

        let call = ToolCall::new("coding_tool", json!({"code_instructions": "sort a list"}));
        let json = serde_json::to_value(ChatMessage::ai("on it", vec![call])).unwrap();
        assert_eq!(json["type"], "ai_tool_request");
        assert_eq!(json["tool_calls"][0]["name"], "coding_tool");
    }

    #[test]
    fn human_message_deserializes_from_wire_form() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"type": "human", "content": "What is 2+2?"}"#).unwrap();
        assert_eq!(msg, ChatMessage::human("What is 2+2?"));
    }

    #[test]
    fn content_accessor_covers_all_roles() {
        let call = ToolCall::new("coding_tool", json!({}));
        let messages = [
            ChatMessage::human("a"),
            ChatMessage::ai("b", vec![]),
            ChatMessage::ai("c", vec![call.clone()]),
            ChatMessage::tool_result(&call, "d"),
        ];
        let contents: Vec<&str> = messages.iter().map(|m| m.content()).collect();
        assert_eq!(contents, ["a", "b", "c", "d"]);
    }
}
