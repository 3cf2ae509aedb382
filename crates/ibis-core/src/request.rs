// ABOUTME: Wire types for the HTTP boundary: the chat request body and the feedback payload.
// ABOUTME: Mirrors the streaming endpoint's input/config split so config stays optional.

use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::message::ChatMessage;

/// The chat messages representing the current conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatInput {
    pub messages: Vec<ChatMessage>,
}

/// Body of a streaming chat request: the input messages plus optional
/// run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub input: ChatInput,
    #[serde(default)]
    pub config: Option<RunConfig>,
}

/// User feedback on a completed run, forwarded verbatim to telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub score: f64,
    #[serde(default)]
    pub text: Option<String>,
    pub run_id: String,
    #[serde(default = "Feedback::default_log_type")]
    pub log_type: String,
    #[serde(default = "Feedback::default_service_name")]
    pub service_name: String,
}

impl Feedback {
    fn default_log_type() -> String {
        "feedback".to_string()
    }

    fn default_service_name() -> String {
        "ibis".to_string()
    }
}
