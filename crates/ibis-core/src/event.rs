// ABOUTME: Defines the event envelope and payload variants streamed back for each workflow step.
// ABOUTME: Events are strictly ordered per request; `done` and `error` are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::message::{ChatMessage, ToolCall};

/// An event envelope wrapping a timestamped, sequenced payload for one
/// chat request. `seq` starts at 0 and increments once per emitted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
    pub run_id: Ulid,
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: ChatEventPayload,
}

/// One incremental change in a chat request's execution. `Model` and
/// `Tool` each carry the single message their step appended; `Tool`
/// additionally carries the originating delegation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEventPayload {
    Model {
        message: ChatMessage,
    },
    Tool {
        call: ToolCall,
        message: ChatMessage,
    },
    Done {
        steps: u32,
    },
    Error {
        message: String,
    },
}

impl ChatEventPayload {
    /// Stable kind name, used as the SSE event name on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Model { .. } => "model",
            Self::Tool { .. } => "tool",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    /// Terminal payloads close the stream; nothing follows them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

impl ChatEvent {
    pub fn new(run_id: Ulid, seq: u64, payload: ChatEventPayload) -> Self {
        Self {
            run_id,
            seq,
            timestamp: Utc::now(),
            payload,
        }
    }
}
