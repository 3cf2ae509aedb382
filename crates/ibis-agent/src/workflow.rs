// ABOUTME: Assembles and drives the two-node workflow graph: model call, conditional edge, tool call.
// ABOUTME: Each executed node appends exactly one message and writes one event to the step emitter.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use ulid::Ulid;

use ibis_core::{ChatEvent, ChatEventPayload, ChatMessage, Conversation, RunConfig, ToolCall};

use crate::router::{Turn, route};
use crate::runtime::{AgentError, ModelRuntime, ToolRuntime};
use crate::telemetry::Telemetry;

/// Sequencing wrapper around the event channel. Stamps run id, sequence
/// number, and timestamp onto each payload and records the step with
/// telemetry. A closed channel means the consumer went away; the send
/// error is surfaced so the workflow abandons its remaining steps.
pub struct StepEmitter {
    tx: mpsc::Sender<ChatEvent>,
    telemetry: Telemetry,
    run_id: Ulid,
    seq: u64,
}

impl StepEmitter {
    pub fn new(tx: mpsc::Sender<ChatEvent>, telemetry: Telemetry, run_id: Ulid) -> Self {
        Self {
            tx,
            telemetry,
            run_id,
            seq: 0,
        }
    }

    /// Emit one event. Suspends while the channel is full, which is the
    /// backpressure point between producer and consumer.
    pub async fn emit(&mut self, payload: ChatEventPayload) -> Result<(), AgentError> {
        self.telemetry.record_step(self.run_id, self.seq, payload.kind());
        let event = ChatEvent::new(self.run_id, self.seq, payload);
        self.seq += 1;
        self.tx
            .send(event)
            .await
            .map_err(|_| AgentError::ChannelClosed)
    }
}

/// The compiled workflow: a model node, a tool node, and the conditional
/// edge between them.
///
/// Edge discipline: model -> router -> (tool | end); tool -> model, so a
/// delegated result is always re-evaluated by the model before any
/// further routing. The step limit bounds the oscillation.
pub struct Workflow {
    model: Arc<dyn ModelRuntime>,
    tools: HashMap<String, Arc<dyn ToolRuntime>>,
    default_max_steps: u32,
}

impl Workflow {
    pub fn new(model: Arc<dyn ModelRuntime>, default_max_steps: u32) -> Self {
        Self {
            model,
            tools: HashMap::new(),
            default_max_steps,
        }
    }

    /// Register a tool runtime under its own name.
    pub fn with_tool(mut self, tool: Arc<dyn ToolRuntime>) -> Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    pub fn model(&self) -> &Arc<dyn ModelRuntime> {
        &self.model
    }

    /// Drive the graph from entry to terminal state.
    ///
    /// Returns the final conversation and the number of completed steps.
    /// Every completed step appended exactly one message and emitted
    /// exactly one event, in completion order.
    pub async fn run(
        &self,
        mut conversation: Conversation,
        config: &RunConfig,
        emitter: &mut StepEmitter,
    ) -> Result<(Conversation, u32), AgentError> {
        let max_steps = config.effective_max_steps(self.default_max_steps);
        let mut steps: u32 = 0;

        loop {
            ensure_capacity(steps, max_steps)?;
            let reply = self.model.invoke(&conversation, config).await?;
            conversation.push(reply.clone());
            steps += 1;
            emitter
                .emit(ChatEventPayload::Model { message: reply })
                .await?;

            match route(&conversation) {
                Turn::Terminate => return Ok((conversation, steps)),
                Turn::Delegate => {
                    for call in pending_tool_calls(&conversation) {
                        ensure_capacity(steps, max_steps)?;
                        let tool = self
                            .tools
                            .get(&call.name)
                            .ok_or_else(|| AgentError::UnknownTool(call.name.clone()))?;
                        let result = tool.invoke(&call).await?;
                        conversation.push(result.clone());
                        steps += 1;
                        emitter
                            .emit(ChatEventPayload::Tool {
                                call,
                                message: result,
                            })
                            .await?;
                    }
                }
            }
        }
    }
}

fn ensure_capacity(steps: u32, max_steps: u32) -> Result<(), AgentError> {
    if steps >= max_steps {
        return Err(AgentError::StepLimitExceeded(max_steps));
    }
    Ok(())
}

/// The delegation requests pending on the conversation's latest message.
fn pending_tool_calls(conversation: &Conversation) -> Vec<ToolCall> {
    match conversation.last() {
        Some(ChatMessage::AiToolRequest { tool_calls, .. }) => tool_calls.clone(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EchoTool, FailingTool, ScriptedModelRuntime};
    use crate::tools::CODING_TOOL;
    use serde_json::json;

    fn make_emitter(run_id: Ulid) -> (StepEmitter, mpsc::Receiver<ChatEvent>) {
        let (tx, rx) = mpsc::channel(32);
        (
            StepEmitter::new(tx, Telemetry::new("ibis-test"), run_id),
            rx,
        )
    }

    fn input(text: &str) -> Conversation {
        Conversation::from_messages(vec![ChatMessage::human(text)])
    }

    fn delegating_reply() -> ChatMessage {
        ChatMessage::ai(
            "delegating to the crew",
            vec![ToolCall::new(
                CODING_TOOL,
                json!({"code_instructions": "fibonacci"}),
            )],
        )
    }

    async fn drain(mut rx: mpsc::Receiver<ChatEvent>) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn plain_reply_terminates_after_one_step() {
        let model = Arc::new(ScriptedModelRuntime::new(vec![ChatMessage::ai(
            "4",
            vec![],
        )]));
        let workflow = Workflow::new(model, 16);

        let config = RunConfig::default();
        let (mut emitter, rx) = make_emitter(config.run_id);
        let (conversation, steps) = workflow
            .run(input("What is 2+2?"), &config, &mut emitter)
            .await
            .unwrap();
        drop(emitter);

        assert_eq!(steps, 1);
        assert_eq!(conversation.len(), 2);

        let events = drain(rx).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload.kind(), "model");
        assert_eq!(events[0].seq, 0);
    }

    #[tokio::test]
    async fn delegation_runs_tool_then_model_again() {
        let model = Arc::new(ScriptedModelRuntime::new(vec![
            delegating_reply(),
            ChatMessage::ai("here is your function", vec![]),
        ]));
        let workflow = Workflow::new(model, 16).with_tool(Arc::new(EchoTool::new(CODING_TOOL)));

        let config = RunConfig::default();
        let (mut emitter, rx) = make_emitter(config.run_id);
        let (conversation, steps) = workflow
            .run(input("write a fibonacci function"), &config, &mut emitter)
            .await
            .unwrap();
        drop(emitter);

        assert_eq!(steps, 3);
        assert_eq!(conversation.len(), 4, "one message appended per step");

        // Event order mirrors step completion order exactly.
        let events = drain(rx).await;
        let kinds: Vec<&str> = events.iter().map(|e| e.payload.kind()).collect();
        assert_eq!(kinds, ["model", "tool", "model"]);
        let seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, [0, 1, 2]);

        // The tool event carries the originating call.
        match &events[1].payload {
            ChatEventPayload::Tool { call, message } => {
                assert_eq!(call.name, CODING_TOOL);
                assert!(matches!(message, ChatMessage::Tool { .. }));
            }
            other => panic!("expected tool payload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn conversation_grows_by_exactly_one_message_per_step() {
        let model = Arc::new(ScriptedModelRuntime::new(vec![
            delegating_reply(),
            delegating_reply(),
            ChatMessage::ai("done", vec![]),
        ]));
        let workflow = Workflow::new(model, 16).with_tool(Arc::new(EchoTool::new(CODING_TOOL)));

        let config = RunConfig::default();
        let (mut emitter, _rx) = make_emitter(config.run_id);
        let initial = input("write it twice");
        let initial_len = initial.len();

        let (conversation, steps) = workflow.run(initial, &config, &mut emitter).await.unwrap();

        assert_eq!(conversation.len(), initial_len + steps as usize);
        assert_eq!(steps, 5);
    }

    #[tokio::test]
    async fn tool_failure_aborts_the_run() {
        let model = Arc::new(ScriptedModelRuntime::new(vec![delegating_reply()]));
        let workflow = Workflow::new(model, 16).with_tool(Arc::new(FailingTool));

        let config = RunConfig::default();
        let (mut emitter, rx) = make_emitter(config.run_id);
        let err = workflow
            .run(input("write a fibonacci function"), &config, &mut emitter)
            .await
            .unwrap_err();
        drop(emitter);

        assert!(matches!(err, AgentError::Tool(_)));

        // Only the model step completed before the failure.
        let events = drain(rx).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload.kind(), "model");
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let model = Arc::new(ScriptedModelRuntime::new(vec![delegating_reply()]));
        let workflow = Workflow::new(model, 16);

        let config = RunConfig::default();
        let (mut emitter, _rx) = make_emitter(config.run_id);
        let err = workflow
            .run(input("write it"), &config, &mut emitter)
            .await
            .unwrap_err();

        match err {
            AgentError::UnknownTool(name) => assert_eq!(name, CODING_TOOL),
            other => panic!("expected UnknownTool, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn step_limit_bounds_the_oscillation() {
        // A model that always delegates would oscillate forever.
        let model = Arc::new(ScriptedModelRuntime::repeating(delegating_reply()));
        let workflow = Workflow::new(model, 16).with_tool(Arc::new(EchoTool::new(CODING_TOOL)));

        let config = RunConfig {
            max_steps: Some(4),
            ..RunConfig::default()
        };
        let (mut emitter, rx) = make_emitter(config.run_id);
        let err = workflow
            .run(input("loop forever"), &config, &mut emitter)
            .await
            .unwrap_err();
        drop(emitter);

        assert!(matches!(err, AgentError::StepLimitExceeded(4)));

        // Exactly max_steps events made it out before the cap hit.
        let events = drain(rx).await;
        assert_eq!(events.len(), 4);
    }

    #[tokio::test]
    async fn multiple_tool_calls_execute_in_order() {
        let reply = ChatMessage::ai(
            "two things",
            vec![
                ToolCall::with_id("call-a", CODING_TOOL, json!({"code_instructions": "a"})),
                ToolCall::with_id("call-b", CODING_TOOL, json!({"code_instructions": "b"})),
            ],
        );
        let model = Arc::new(ScriptedModelRuntime::new(vec![
            reply,
            ChatMessage::ai("both done", vec![]),
        ]));
        let workflow = Workflow::new(model, 16).with_tool(Arc::new(EchoTool::new(CODING_TOOL)));

        let config = RunConfig::default();
        let (mut emitter, rx) = make_emitter(config.run_id);
        let (_conversation, steps) = workflow
            .run(input("do both"), &config, &mut emitter)
            .await
            .unwrap();
        drop(emitter);

        assert_eq!(steps, 4);

        let events = drain(rx).await;
        let kinds: Vec<&str> = events.iter().map(|e| e.payload.kind()).collect();
        assert_eq!(kinds, ["model", "tool", "tool", "model"]);

        let call_ids: Vec<&str> = events
            .iter()
            .filter_map(|e| match &e.payload {
                ChatEventPayload::Tool { call, .. } => Some(call.call_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(call_ids, ["call-a", "call-b"]);
    }

    #[tokio::test]
    async fn dropped_receiver_abandons_remaining_steps() {
        let model = Arc::new(ScriptedModelRuntime::repeating(delegating_reply()));
        let workflow = Workflow::new(model, 16).with_tool(Arc::new(EchoTool::new(CODING_TOOL)));

        let config = RunConfig::default();
        let (tx, rx) = mpsc::channel(1);
        let mut emitter = StepEmitter::new(tx, Telemetry::new("ibis-test"), config.run_id);
        drop(rx);

        let err = workflow
            .run(input("anyone listening?"), &config, &mut emitter)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::ChannelClosed));
    }
}
