// ABOUTME: Provider module aggregating the model runtime adapters.
// ABOUTME: Each sub-module implements ModelRuntime for a specific LLM API.

use std::sync::Arc;

use serde_json::Value;

use crate::runtime::{AgentError, ModelRuntime};

pub mod anthropic;
pub mod gemini;

pub use anthropic::AnthropicRuntime;
pub use gemini::GeminiRuntime;

/// System prompt for the lead engineer persona that fronts the chat.
pub const LEAD_ENGINEER_PROMPT: &str = "You are an expert Lead Software Engineer Manager.\n\
    Your role is to speak to a user and understand what kind of code they need to build.\n\
    Part of your task is therefore to gather requirements and clarifying ambiguity by \
    asking followup questions. Don't ask all the questions together as the user has a \
    low attention span, rather ask a question at the time.\n\
    Once the problem to solve is clear, you will call your tool for writing the solution.\n\
    Remember, you are an expert in understanding requirements but you cannot code, use \
    your coding tool to generate a solution. Keep the test cases if any, they are useful \
    for the user.";

/// Create a model runtime for the given provider name.
///
/// The model is resolved from the explicit `model` parameter when given,
/// then a provider-specific environment variable, then the provider's
/// default. API keys come from the environment; a missing key is a
/// construction error, reported before any request is served.
pub fn create_model_runtime(
    provider: &str,
    model: Option<&str>,
    system_prompt: &str,
    tools: Vec<Value>,
) -> Result<Arc<dyn ModelRuntime>, AgentError> {
    match provider {
        "gemini" => Ok(Arc::new(GeminiRuntime::from_env(
            model,
            system_prompt,
            tools,
        )?)),
        "anthropic" => Ok(Arc::new(AnthropicRuntime::from_env(
            model,
            system_prompt,
            tools,
        )?)),
        unknown => Err(AgentError::Provider(format!(
            "unsupported LLM provider: {unknown}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serialize all tests that read/write env vars to prevent race conditions.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn expect_err(result: Result<Arc<dyn ModelRuntime>, AgentError>) -> String {
        match result {
            Err(e) => e.to_string(),
            Ok(runtime) => panic!(
                "expected error, got Ok with model: {}",
                runtime.model_name()
            ),
        }
    }

    #[test]
    fn unknown_provider_returns_error() {
        let err = expect_err(create_model_runtime("unknown", None, "prompt", vec![]));
        assert!(
            err.contains("unsupported LLM provider"),
            "expected 'unsupported LLM provider' in error, got: {}",
            err
        );
    }

    #[test]
    fn gemini_missing_api_key_returns_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe { std::env::remove_var("GEMINI_API_KEY") };
        let err = expect_err(create_model_runtime("gemini", None, "prompt", vec![]));
        assert!(
            err.contains("GEMINI_API_KEY"),
            "expected mention of GEMINI_API_KEY in error, got: {}",
            err
        );
    }

    #[test]
    fn anthropic_missing_api_key_returns_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe { std::env::remove_var("ANTHROPIC_API_KEY") };
        let err = expect_err(create_model_runtime("anthropic", None, "prompt", vec![]));
        assert!(
            err.contains("ANTHROPIC_API_KEY"),
            "expected mention of ANTHROPIC_API_KEY in error, got: {}",
            err
        );
    }

    #[test]
    fn explicit_model_param_overrides_default() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe {
            std::env::set_var("GEMINI_API_KEY", "test-key-456");
            std::env::remove_var("GEMINI_MODEL");
        }

        let result = create_model_runtime("gemini", Some("gemini-2.5-pro"), "prompt", vec![]);

        unsafe { std::env::remove_var("GEMINI_API_KEY") };

        let runtime = match result {
            Ok(runtime) => runtime,
            Err(e) => panic!("expected Ok, got Err: {}", e),
        };
        assert_eq!(runtime.model_name(), "gemini-2.5-pro");
        assert_eq!(runtime.provider_name(), "gemini");
    }
}
