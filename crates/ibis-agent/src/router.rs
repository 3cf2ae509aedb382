// ABOUTME: The turn router: decides after each model reply whether to delegate or terminate.
// ABOUTME: A pure function of the latest message's variant; never inspects earlier history.

use ibis_core::{ChatMessage, Conversation};

/// The two-valued routing decision consumed by the workflow's
/// conditional edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    /// The latest reply carries tool calls; run the tool node next.
    Delegate,
    /// No pending delegation; the conversation is complete.
    Terminate,
}

/// Decide the next edge from the model node.
///
/// Only the most recently appended message matters. A delegating reply
/// routes to the tool node; every other shape terminates. The
/// `AiToolRequest` constructor guarantees a non-empty call list, so the
/// match needs no emptiness probe.
pub fn route(conversation: &Conversation) -> Turn {
    match conversation.last() {
        Some(ChatMessage::AiToolRequest { .. }) => Turn::Delegate,
        _ => Turn::Terminate,
    }
}
