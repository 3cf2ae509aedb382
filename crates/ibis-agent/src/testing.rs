// ABOUTME: Test utilities for ibis-agent: a scripted model runtime and canned tool runtimes.
// ABOUTME: Used in tests to drive workflows to completion without real API calls.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use ibis_core::{ChatMessage, Conversation, RunConfig, ToolCall};

use crate::runtime::{AgentError, ModelRuntime, ToolRuntime};

enum Script {
    Sequence(Mutex<VecDeque<ChatMessage>>),
    Repeat(ChatMessage),
}

/// A model runtime that replays a pre-scripted sequence of replies.
///
/// Invoking past the end of the script is a provider error, so a test
/// that consumes more model steps than it scripted fails loudly instead
/// of looping.
pub struct ScriptedModelRuntime {
    script: Script,
}

impl ScriptedModelRuntime {
    /// Replay the given replies in order.
    pub fn new(replies: Vec<ChatMessage>) -> Self {
        Self {
            script: Script::Sequence(Mutex::new(replies.into())),
        }
    }

    /// Return the same reply on every invocation. Useful for driving the
    /// step limit.
    pub fn repeating(reply: ChatMessage) -> Self {
        Self {
            script: Script::Repeat(reply),
        }
    }

    /// Convenience constructor for a single plain text reply.
    pub fn plain(text: &str) -> Self {
        Self::new(vec![ChatMessage::ai(text, vec![])])
    }
}

#[async_trait]
impl ModelRuntime for ScriptedModelRuntime {
    async fn invoke(
        &self,
        _conversation: &Conversation,
        _config: &RunConfig,
    ) -> Result<ChatMessage, AgentError> {
        match &self.script {
            Script::Sequence(replies) => replies
                .lock()
                .expect("script mutex poisoned")
                .pop_front()
                .ok_or_else(|| AgentError::Provider("scripted replies exhausted".to_string())),
            Script::Repeat(reply) => Ok(reply.clone()),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

/// A tool runtime that echoes the call's arguments back as its result.
pub struct EchoTool {
    name: String,
}

impl EchoTool {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl ToolRuntime for EchoTool {
    async fn invoke(&self, call: &ToolCall) -> Result<ChatMessage, AgentError> {
        Ok(ChatMessage::tool_result(
            call,
            format!("echo: {}", call.arguments),
        ))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A tool runtime that always fails with an execution error.
pub struct FailingTool;

#[async_trait]
impl ToolRuntime for FailingTool {
    async fn invoke(&self, _call: &ToolCall) -> Result<ChatMessage, AgentError> {
        Err(AgentError::Tool("synthetic tool failure".to_string()))
    }

    fn name(&self) -> &str {
        crate::tools::CODING_TOOL
    }
}
