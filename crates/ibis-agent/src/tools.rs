// ABOUTME: Tool definitions for LLM function calling, expressed as serde_json::Value structs.
// ABOUTME: Provider adapters reformat these to match their API's tool specification.

use serde_json::{Value, json};

/// Name of the delegated coding tool the lead engineer can call.
pub const CODING_TOOL: &str = "coding_tool";

/// Return the complete set of tool definitions offered to the model.
/// These are provider-agnostic JSON schemas; each provider adapter
/// reformats them to match its API's tool specification.
pub fn all_tool_definitions() -> Vec<Value> {
    vec![coding_tool()]
}

/// Tool: delegate program writing to the dev crew.
fn coding_tool() -> Value {
    json!({
        "name": CODING_TOOL,
        "description": "Write a python program given a set of requirements and or instructions. Use this tool once the problem to solve is clear.",
        "parameters": {
            "type": "object",
            "properties": {
                "code_instructions": {
                    "type": "string",
                    "description": "The requirements and instructions for the program to write."
                }
            },
            "required": ["code_instructions"]
        }
    })
}
