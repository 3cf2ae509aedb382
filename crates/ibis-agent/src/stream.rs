// ABOUTME: The event streamer: converts one chat request into an ordered, incrementally produced event stream.
// ABOUTME: Preconditions are checked before any step runs; a terminal done/error event closes the stream.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Instrument;

use ibis_core::{ChatEvent, ChatEventPayload, ChatRequest, Conversation};

use crate::runtime::AgentError;
use crate::telemetry::Telemetry;
use crate::workflow::{StepEmitter, Workflow};

/// Events buffered between producer and consumer before the producer
/// suspends. Small, so a slow consumer exerts backpressure quickly.
const EVENT_BUFFER: usize = 32;

/// The request-handling entry point: owns the compiled workflow and the
/// telemetry context, and turns each inbound chat request into a lazy,
/// finite, non-restartable event stream.
pub struct ChatAgent {
    workflow: Arc<Workflow>,
    telemetry: Telemetry,
}

impl ChatAgent {
    pub fn new(workflow: Workflow, telemetry: Telemetry) -> Self {
        Self {
            workflow: Arc::new(workflow),
            telemetry,
        }
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Start one chat request and return its event stream.
    ///
    /// Precondition violations (an empty conversation) fail synchronously
    /// before any step executes. Everything after that arrives on the
    /// stream: one `model`/`tool` event per completed step in completion
    /// order, then a terminal `done`, or a terminal `error` if a
    /// collaborator failed or the step limit was hit. Dropping the stream
    /// abandons the remaining steps between completions.
    pub fn stream_chat(
        &self,
        request: ChatRequest,
    ) -> Result<ReceiverStream<ChatEvent>, AgentError> {
        if request.input.messages.is_empty() {
            return Err(AgentError::EmptyConversation);
        }

        let config = request.config.unwrap_or_default();
        let conversation = Conversation::from_messages(request.input.messages);

        let span = self.telemetry.request_span(&config);
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let mut emitter = StepEmitter::new(tx, self.telemetry.clone(), config.run_id);
        let workflow = Arc::clone(&self.workflow);

        tokio::spawn(
            async move {
                match workflow.run(conversation, &config, &mut emitter).await {
                    Ok((_state, steps)) => {
                        let _ = emitter.emit(ChatEventPayload::Done { steps }).await;
                    }
                    // The consumer went away between steps; no one left to tell.
                    Err(AgentError::ChannelClosed) => {}
                    Err(err) => {
                        tracing::error!(error = %err, "chat workflow aborted");
                        let _ = emitter
                            .emit(ChatEventPayload::Error {
                                message: err.to_string(),
                            })
                            .await;
                    }
                }
            }
            .instrument(span),
        );

        Ok(ReceiverStream::new(rx))
    }
}
