// ABOUTME: Explicitly constructed telemetry context, created in main and passed to agent and server.
// ABOUTME: Emits structured tracing events carrying request association properties; owns no exporter.

use ibis_core::{Feedback, RunConfig};
use tracing::Span;
use ulid::Ulid;

/// Telemetry handle threaded through the request path.
///
/// Everything is expressed as structured `tracing` events and spans, so
/// whichever subscriber the process installs (fmt, OTLP, a cloud
/// exporter) picks the annotations up without this crate knowing about it.
#[derive(Debug, Clone)]
pub struct Telemetry {
    service_name: String,
    commit_sha: Option<String>,
}

impl Telemetry {
    /// Create a telemetry context for the given service. Reads the
    /// deployed revision from `COMMIT_SHA` when present.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            commit_sha: std::env::var("COMMIT_SHA").ok().filter(|s| !s.is_empty()),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Span covering one chat request, carrying its association properties.
    pub fn request_span(&self, config: &RunConfig) -> Span {
        tracing::info_span!(
            "chat_request",
            service = %self.service_name,
            run_id = %config.run_id,
            user_id = config.user_id.as_deref().unwrap_or("none"),
            session_id = config.session_id.as_deref().unwrap_or("none"),
            commit_sha = self.commit_sha.as_deref().unwrap_or("none"),
        )
    }

    /// Record one completed workflow step.
    pub fn record_step(&self, run_id: Ulid, seq: u64, kind: &str) {
        tracing::info!(run_id = %run_id, seq, kind, "workflow step completed");
    }

    /// Record a feedback submission verbatim.
    pub fn record_feedback(&self, feedback: &Feedback) {
        tracing::info!(
            log_type = %feedback.log_type,
            service = %feedback.service_name,
            run_id = %feedback.run_id,
            score = feedback.score,
            text = feedback.text.as_deref().unwrap_or(""),
            "feedback received"
        );
    }
}
