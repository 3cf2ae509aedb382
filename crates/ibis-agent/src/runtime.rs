// ABOUTME: Defines the ModelRuntime and ToolRuntime traits the workflow delegates to.
// ABOUTME: Also defines AgentError, the error surface for every agent-side failure.

use async_trait::async_trait;

use ibis_core::{ChatMessage, Conversation, RunConfig, ToolCall};

/// Errors that can occur while driving a chat request.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The request arrived with no messages; nothing to route on.
    #[error("conversation is empty")]
    EmptyConversation,

    /// A tool call's argument payload does not match the tool's schema.
    #[error("malformed tool call: {0}")]
    MalformedToolCall(String),

    /// The model requested a tool that no registered runtime answers to.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The model collaborator failed (transport, auth, server error).
    #[error("provider error: {0}")]
    Provider(String),

    #[error("rate limited")]
    RateLimited,

    /// The model replied with a shape the adapter cannot interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A delegated tool failed while executing.
    #[error("tool execution failed: {0}")]
    Tool(String),

    /// The model/tool oscillation exceeded the configured bound.
    #[error("step limit exceeded after {0} steps")]
    StepLimitExceeded(u32),

    /// The event consumer went away mid-run.
    #[error("event channel closed")]
    ChannelClosed,
}

/// The model-invocation collaborator. Given the full conversation, produce
/// the next reply, plain or delegating. Implementations must be safe for
/// concurrent independent invocations; each request owns its own state.
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    async fn invoke(
        &self,
        conversation: &Conversation,
        config: &RunConfig,
    ) -> Result<ChatMessage, AgentError>;

    /// Provider name for logging and display (e.g. "gemini", "anthropic").
    fn provider_name(&self) -> &str;

    /// Model identifier being used (e.g. "gemini-2.0-flash").
    fn model_name(&self) -> &str;
}

/// A delegated sub-agent or tool. Given a pending tool call, produce the
/// tool-result message that answers it. Failures are surfaced, not retried.
#[async_trait]
pub trait ToolRuntime: Send + Sync {
    async fn invoke(&self, call: &ToolCall) -> Result<ChatMessage, AgentError>;

    /// The tool name this runtime answers to.
    fn name(&self) -> &str;
}
