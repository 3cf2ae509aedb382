// ABOUTME: Feedback collection handler: validates the payload and forwards it to telemetry.
// ABOUTME: Pure pass-through; no decision logic lives here.

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use ibis_core::Feedback;

use crate::app_state::SharedState;

/// POST /feedback - collect and log feedback for a run.
pub async fn collect_feedback(
    State(state): State<SharedState>,
    Json(feedback): Json<Feedback>,
) -> impl IntoResponse {
    state.telemetry.record_feedback(&feedback);
    Json(serde_json::json!({ "status": "success" }))
}
