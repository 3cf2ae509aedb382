// ABOUTME: Anthropic Claude API adapter implementing the ModelRuntime trait.
// ABOUTME: Translates the conversation into Messages API calls and maps tool_use blocks back.

use async_trait::async_trait;
use serde_json::{Value, json};

use ibis_core::{ChatMessage, Conversation, RunConfig, ToolCall};

use crate::runtime::{AgentError, ModelRuntime};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

/// Anthropic Claude runtime adapter. Calls the Messages API with tool
/// definitions and maps tool_use responses back to chat messages.
pub struct AnthropicRuntime {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    system_prompt: String,
    tools: Vec<Value>,
}

impl AnthropicRuntime {
    /// Create a new AnthropicRuntime reading configuration from environment variables.
    /// Required: `ANTHROPIC_API_KEY`
    /// Optional: `ANTHROPIC_BASE_URL` (defaults to https://api.anthropic.com)
    /// Optional: `ANTHROPIC_MODEL` (defaults to claude-sonnet-4-5-20250929)
    pub fn from_env(
        model: Option<&str>,
        system_prompt: &str,
        tools: Vec<Value>,
    ) -> Result<Self, AgentError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| AgentError::Provider("ANTHROPIC_API_KEY not set".to_string()))?;

        let base_url =
            std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let model = model
            .map(String::from)
            .or_else(|| std::env::var("ANTHROPIC_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self::new(api_key, base_url, model, system_prompt, tools))
    }

    /// Create a new AnthropicRuntime with explicit configuration.
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        system_prompt: &str,
        tools: Vec<Value>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model,
            system_prompt: system_prompt.to_string(),
            tools,
        }
    }

    /// Build the JSON request body for the Messages API.
    pub fn build_request_body(&self, conversation: &Conversation) -> Value {
        let messages = coalesce_messages(
            conversation.messages().iter().map(message_to_api).collect(),
        );

        let mut body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "temperature": 0,
            "system": self.system_prompt,
            "messages": messages
        });

        if !self.tools.is_empty() {
            body["tools"] = Value::Array(build_anthropic_tools(&self.tools));
        }

        body
    }

    /// Parse a Messages API response into the next chat message.
    pub fn parse_response(response_body: &Value) -> Result<ChatMessage, AgentError> {
        let content = response_body
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| {
                AgentError::InvalidResponse("missing content array in response".to_string())
            })?;

        let mut text_parts: Vec<&str> = Vec::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();

        for block in content {
            match block.get("type").and_then(|t| t.as_str()) {
                Some("text") => {
                    if let Some(text) = block.get("text").and_then(|t| t.as_str()) {
                        text_parts.push(text);
                    }
                }
                Some("tool_use") => {
                    let id = block
                        .get("id")
                        .and_then(|i| i.as_str())
                        .ok_or_else(|| {
                            AgentError::InvalidResponse("tool_use block missing id".to_string())
                        })?;
                    let name = block
                        .get("name")
                        .and_then(|n| n.as_str())
                        .ok_or_else(|| {
                            AgentError::InvalidResponse("tool_use block missing name".to_string())
                        })?;
                    let input = block.get("input").cloned().unwrap_or(json!({}));
                    tool_calls.push(ToolCall::with_id(id, name, input));
                }
                _ => {}
            }
        }

        Ok(ChatMessage::ai(text_parts.join("\n"), tool_calls))
    }
}

/// Convert tool definitions to Anthropic's tool format.
fn build_anthropic_tools(tools: &[Value]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.get("name").cloned().unwrap_or(Value::Null),
                "description": tool.get("description").cloned().unwrap_or(Value::Null),
                "input_schema": tool.get("parameters").cloned().unwrap_or(json!({"type": "object"}))
            })
        })
        .collect()
}

/// Convert one chat message into a Messages API entry.
fn message_to_api(message: &ChatMessage) -> Value {
    match message {
        ChatMessage::Human { content } => json!({
            "role": "user",
            "content": [{"type": "text", "text": content}]
        }),
        ChatMessage::Ai { content } => json!({
            "role": "assistant",
            "content": [{"type": "text", "text": content}]
        }),
        ChatMessage::AiToolRequest {
            content,
            tool_calls,
        } => {
            let mut blocks = Vec::new();
            if !content.is_empty() {
                blocks.push(json!({"type": "text", "text": content}));
            }
            for call in tool_calls {
                blocks.push(json!({
                    "type": "tool_use",
                    "id": call.call_id,
                    "name": call.name,
                    "input": call.arguments
                }));
            }
            json!({"role": "assistant", "content": blocks})
        }
        ChatMessage::Tool {
            content, call_id, ..
        } => json!({
            "role": "user",
            "content": [{
                "type": "tool_result",
                "tool_use_id": call_id,
                "content": content
            }]
        }),
    }
}

/// Merge consecutive messages with the same role by concatenating their
/// content blocks. The Messages API requires alternating roles.
fn coalesce_messages(messages: Vec<Value>) -> Vec<Value> {
    let mut result: Vec<Value> = Vec::new();

    for msg in messages {
        let role = msg.get("role").and_then(|r| r.as_str()).unwrap_or("user");

        if let Some(last) = result.last_mut()
            && last.get("role").and_then(|r| r.as_str()) == Some(role)
        {
            let mut blocks = last
                .get("content")
                .and_then(|c| c.as_array())
                .cloned()
                .unwrap_or_default();
            blocks.extend(
                msg.get("content")
                    .and_then(|c| c.as_array())
                    .cloned()
                    .unwrap_or_default(),
            );
            *last = json!({"role": role, "content": blocks});
            continue;
        }

        result.push(msg);
    }

    result
}

#[async_trait]
impl ModelRuntime for AnthropicRuntime {
    async fn invoke(
        &self,
        conversation: &Conversation,
        _config: &RunConfig,
    ) -> Result<ChatMessage, AgentError> {
        let body = self.build_request_body(conversation);
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Provider(format!("HTTP request failed: {e}")))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AgentError::RateLimited);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AgentError::Provider(
                "Unauthorized: check ANTHROPIC_API_KEY".to_string(),
            ));
        }

        if status.is_server_error() {
            return Err(AgentError::Provider(format!("Server error: {status}")));
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider(format!(
                "API error {status}: {error_body}"
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(format!("failed to parse JSON: {e}")))?;

        Self::parse_response(&response_body)
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
