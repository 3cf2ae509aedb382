// ABOUTME: SSE streaming handler for the chat endpoint.
// ABOUTME: Converts the agent's event stream into SSE frames named after each payload kind.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures::stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

use ibis_core::{ChatEvent, ChatRequest};

use crate::app_state::SharedState;

/// Convert the agent's event receiver into an SSE-compatible stream.
/// Each frame's event name is the payload kind and its data the full
/// JSON envelope.
fn sse_stream_from_events(
    events: ReceiverStream<ChatEvent>,
) -> impl Stream<Item = Result<SseEvent, axum::Error>> {
    events.filter_map(|event| {
        let kind = event.payload.kind();
        let data = serde_json::to_string(&event).ok()?;
        Some(Ok(SseEvent::default().event(kind).data(data)))
    })
}

/// POST /stream_messages - stream chat events in response to an input request.
///
/// Precondition violations fail with 400 before the stream opens; any
/// later failure arrives as a terminal `error` event on the stream itself.
pub async fn stream_messages(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    match state.agent.stream_chat(request) {
        Ok(events) => Sse::new(sse_stream_from_events(events))
            .keep_alive(KeepAlive::default())
            .into_response(),
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}
