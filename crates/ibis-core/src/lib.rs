// ABOUTME: Core library for ibis, containing the shared chat data model.
// ABOUTME: Defines messages, conversation state, run configuration, events, and wire types.

pub mod config;
pub mod conversation;
pub mod event;
pub mod message;
pub mod request;

pub use config::RunConfig;
pub use conversation::Conversation;
pub use event::{ChatEvent, ChatEventPayload};
pub use message::{ChatMessage, ToolCall};
pub use request::{ChatInput, ChatRequest, Feedback};
