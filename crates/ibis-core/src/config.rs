// ABOUTME: Per-request run configuration: identifiers for telemetry and the step limit override.
// ABOUTME: A missing run_id is filled with a fresh ULID at deserialization time.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Step limit applied when neither the service config nor the request
/// supplies one. Bounds the model/tool oscillation for a single request.
pub const DEFAULT_MAX_STEPS: u32 = 16;

/// Optional configuration accompanying a chat request.
///
/// `run_id` ties the request's events, traces, and feedback together;
/// callers that omit it get a fresh one. `max_steps` overrides the
/// service-level step limit for this request only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub run_id: Ulid,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub max_steps: Option<u32>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_id: Ulid::new(),
            user_id: None,
            session_id: None,
            max_steps: None,
        }
    }
}

impl RunConfig {
    /// The step limit in effect for this request, falling back to the
    /// service default when the request did not set one.
    pub fn effective_max_steps(&self, service_default: u32) -> u32 {
        self.max_steps.unwrap_or(service_default)
    }
}
