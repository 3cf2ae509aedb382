// ABOUTME: Append-only conversation state for a single in-flight chat request.
// ABOUTME: Length only grows, one message per workflow step; never shared across requests.

use serde::{Deserialize, Serialize};

use crate::message::ChatMessage;

/// Ordered message history for one in-flight request.
///
/// The API is deliberately append-only: workflow steps add exactly one
/// message each, and nothing removes or reorders messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation(Vec<ChatMessage>);

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Self(messages)
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.0.push(message);
    }

    /// The most recently appended message, if any.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.0
    }
}

impl From<Vec<ChatMessage>> for Conversation {
    fn from(messages: Vec<ChatMessage>) -> Self {
        Self(messages)
    }
}
