// ABOUTME: Google Gemini API adapter implementing the ModelRuntime trait.
// ABOUTME: Translates the conversation into generateContent calls and maps functionCall parts back.

use async_trait::async_trait;
use serde_json::{Value, json};

use ibis_core::{ChatMessage, Conversation, RunConfig, ToolCall};

use crate::runtime::{AgentError, ModelRuntime};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const MAX_TOKENS: u32 = 4096;

/// Google Gemini runtime adapter. Calls the generateContent API with
/// function declarations and maps functionCall responses back to chat
/// messages.
pub struct GeminiRuntime {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    system_prompt: String,
    tools: Vec<Value>,
}

impl GeminiRuntime {
    /// Create a new GeminiRuntime reading configuration from environment variables.
    /// Required: `GEMINI_API_KEY`
    /// Optional: `GEMINI_BASE_URL` (defaults to https://generativelanguage.googleapis.com)
    /// Optional: `GEMINI_MODEL` (defaults to gemini-2.0-flash)
    pub fn from_env(
        model: Option<&str>,
        system_prompt: &str,
        tools: Vec<Value>,
    ) -> Result<Self, AgentError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| AgentError::Provider("GEMINI_API_KEY not set".to_string()))?;

        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let model = model
            .map(String::from)
            .or_else(|| std::env::var("GEMINI_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self::new(api_key, base_url, model, system_prompt, tools))
    }

    /// Create a new GeminiRuntime with explicit configuration.
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

    /// Build the JSON request body for the generateContent API.
    pub fn build_request_body(&self, conversation: &Conversation) -> Value {
        let contents: Vec<Value> = conversation.messages().iter().map(message_to_content).collect();

        let mut body = json!({
            "system_instruction": {
                "parts": [{"text": self.system_prompt}]
            },
            "contents": contents,
            "generation_config": {
                "max_output_tokens": MAX_TOKENS,
                "temperature": 0
            }
        });

        if !self.tools.is_empty() {
            body["tools"] = json!([{"function_declarations": self.tools}]);
        }

        body
    }

    /// Parse a generateContent response into the next chat message.
    pub fn parse_response(response_body: &Value) -> Result<ChatMessage, AgentError> {
        let candidates = response_body
            .get("candidates")
            .and_then(|c| c.as_array())
            .ok_or_else(|| {
                AgentError::InvalidResponse("missing candidates array in response".to_string())
            })?;

        let candidate = candidates
            .first()
            .ok_or_else(|| AgentError::InvalidResponse("empty candidates array".to_string()))?;

        let parts = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array());

        let Some(parts) = parts else {
            // A candidate with no parts and a normal stop is an empty reply.
            let finish_reason = candidate
                .get("finishReason")
                .and_then(|f| f.as_str())
                .unwrap_or("");
            if finish_reason == "STOP" {
                return Ok(ChatMessage::ai("", vec![]));
            }
            return Err(AgentError::InvalidResponse(
                "missing parts array in candidate content".to_string(),
            ));
        };

        let mut text_parts: Vec<&str> = Vec::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();

        for part in parts {
            if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                text_parts.push(text);
            }
            if let Some(function_call) = part.get("functionCall") {
                let name = function_call
                    .get("name")
                    .and_then(|n| n.as_str())
                    .ok_or_else(|| {
                        AgentError::InvalidResponse("functionCall missing name".to_string())
                    })?;
                let args = function_call.get("args").cloned().unwrap_or(json!({}));
                // Gemini assigns no call ids; generate one for the round trip.
                tool_calls.push(ToolCall::new(name, args));
            }
        }

        Ok(ChatMessage::ai(text_parts.join("\n"), tool_calls))
    }
}

/// Convert one chat message into a generateContent `contents` entry.
fn message_to_content(message: &ChatMessage) -> Value {
    match message {
        ChatMessage::Human { content } => json!({
            "role": "user",
            "parts": [{"text": content}]
        }),
        ChatMessage::Ai { content } => json!({
            "role": "model",
            "parts": [{"text": content}]
        }),
        ChatMessage::AiToolRequest {
            content,
            tool_calls,
        } => {
            let mut parts = Vec::new();
            if !content.is_empty() {
                parts.push(json!({"text": content}));
            }
            for call in tool_calls {
                parts.push(json!({
                    "functionCall": {
                        "name": call.name,
                        "args": call.arguments
                    }
                }));
            }
            json!({"role": "model", "parts": parts})
        }
        ChatMessage::Tool { content, name, .. } => json!({
            "role": "user",
            "parts": [{
                "functionResponse": {
                    "name": name,
                    "response": {"content": content}
                }
            }]
        }),
    }
}

#[async_trait]
impl ModelRuntime for GeminiRuntime {
    async fn invoke(
        &self,
        conversation: &Conversation,
        _config: &RunConfig,
    ) -> Result<ChatMessage, AgentError> {
        let body = self.build_request_body(conversation);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Provider(format!("HTTP request failed: {e}")))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AgentError::RateLimited);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AgentError::Provider(
                "Unauthorized: check GEMINI_API_KEY".to_string(),
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
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
