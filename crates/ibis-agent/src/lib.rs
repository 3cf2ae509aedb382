// ABOUTME: Agent system for ibis: the turn router, workflow graph, and event streamer.
// ABOUTME: Defines the model/tool runtime traits, provider adapters, and the delegated dev crew.

pub mod crew;
pub mod providers;
pub mod router;
pub mod runtime;
pub mod stream;
pub mod telemetry;
pub mod testing;
pub mod tools;
pub mod workflow;

pub use crew::{CodingTool, DevCrew};
pub use providers::create_model_runtime;
pub use router::{Turn, route};
pub use runtime::{AgentError, ModelRuntime, ToolRuntime};
pub use stream::ChatAgent;
pub use telemetry::Telemetry;
pub use tools::{CODING_TOOL, all_tool_definitions};
pub use workflow::Workflow;
