// ABOUTME: The delegated dev crew: a sequential two-stage pipeline over model runtimes.
// ABOUTME: A senior engineer stage drafts the program, then a chief QA stage reviews and corrects it.

use std::sync::Arc;

use async_trait::async_trait;

use ibis_core::{ChatMessage, Conversation, RunConfig, ToolCall};

use crate::runtime::{AgentError, ModelRuntime, ToolRuntime};
use crate::tools::CODING_TOOL;

/// System prompt for the senior engineer stage.
pub const SENIOR_ENGINEER_PROMPT: &str = "You are a senior software engineer with deep \
    experience writing clean, idiomatic python. Given a set of requirements, write a \
    complete, working python program that satisfies them. Include the test cases if any \
    were requested, they are useful for the user. Output only the program.";

/// System prompt for the chief QA engineer stage.
pub const CHIEF_QA_ENGINEER_PROMPT: &str = "You are the chief QA engineer. You review \
    python programs written by other engineers against their requirements. Check for \
    logic errors, missing edge cases, and deviations from the requirements. Return the \
    final, corrected program, keeping any test cases. Output only the program.";

/// The delegated coding crew. Stage order is fixed: the engineer drafts,
/// QA reviews the draft against the original instructions.
pub struct DevCrew {
    engineer: Arc<dyn ModelRuntime>,
    qa: Arc<dyn ModelRuntime>,
}

impl DevCrew {
    pub fn new(engineer: Arc<dyn ModelRuntime>, qa: Arc<dyn ModelRuntime>) -> Self {
        Self { engineer, qa }
    }

    /// Run both stages for the given instructions and return the
    /// reviewed program.
    pub async fn kickoff(&self, code_instructions: &str) -> Result<String, AgentError> {
        let config = RunConfig::default();

        let mut draft_conv = Conversation::new();
        draft_conv.push(ChatMessage::human(format!(
            "Write a python program for the following requirements:\n\n{code_instructions}"
        )));
        let draft = self.engineer.invoke(&draft_conv, &config).await?;
        tracing::debug!(
            provider = self.engineer.provider_name(),
            chars = draft.content().len(),
            "dev crew draft complete"
        );

        let mut review_conv = Conversation::new();
        review_conv.push(ChatMessage::human(format!(
            "Requirements:\n{code_instructions}\n\nCandidate program:\n{}\n\n\
             Review the candidate against the requirements and return the final program.",
            draft.content()
        )));
        let reviewed = self.qa.invoke(&review_conv, &config).await?;
        tracing::debug!(
            provider = self.qa.provider_name(),
            chars = reviewed.content().len(),
            "dev crew review complete"
        );

        Ok(reviewed.content().to_string())
    }
}

/// Tool runtime exposing the dev crew as the `coding_tool` delegation
/// target. Crew failures surface as tool execution errors.
pub struct CodingTool {
    crew: DevCrew,
}

impl CodingTool {
    pub fn new(crew: DevCrew) -> Self {
        Self { crew }
    }
}

#[async_trait]
impl ToolRuntime for CodingTool {
    async fn invoke(&self, call: &ToolCall) -> Result<ChatMessage, AgentError> {
        let instructions = call
            .arguments
            .get("code_instructions")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                AgentError::MalformedToolCall(
                    "coding_tool requires a string code_instructions argument".to_string(),
                )
            })?;

        let program = self
            .crew
            .kickoff(instructions)
            .await
            .map_err(|e| AgentError::Tool(e.to_string()))?;

        Ok(ChatMessage::tool_result(call, program))
    }

    fn name(&self) -> &str {
        CODING_TOOL
    }
}
