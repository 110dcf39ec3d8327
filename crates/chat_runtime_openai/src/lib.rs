//! OpenAI-compatible implementation of the `chat_runtime` contract.
//!
//! This adapter translates Chat Completions stream semantics into `RunEvent`s and
//! drives the host-mediated tool loop: when a round ends with tool calls, each
//! call is executed through the host callback and the conversation continues with
//! the results, up to [`MAX_TOOL_ROUNDS`] times.

use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chat_runtime::{
    CancelSignal, ChatRuntime, RunEvent, RunMessage, RunRequest, RuntimeInitError, RuntimeProfile,
    ToolCallRequest, ToolDefinition, ToolResult,
};
use openai_chat_api::{
    ChatCompletionRequest, ChatMessage, ChatStreamEvent, ChatTool, ChatToolCall, FinishReason,
    OpenAiChatClient, OpenAiChatConfig, OpenAiChatError,
};
use serde_json::Value;

/// Stable runtime identifier used for explicit startup selection.
pub const OPENAI_RUNTIME_ID: &str = "openai";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Tool rounds allowed per run before the run fails.
pub const MAX_TOOL_ROUNDS: usize = 5;

/// Runtime configuration for the OpenAI-compatible runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiRuntimeConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub organization: Option<String>,
    pub timeout: Option<Duration>,
}

impl OpenAiRuntimeConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            organization: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_client_config(self) -> OpenAiChatConfig {
        let mut config = OpenAiChatConfig::new(self.api_key);

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(organization) = self.organization {
            config = config.with_organization(organization);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

trait StreamClient: Send + Sync {
    fn stream(
        &self,
        request: &ChatCompletionRequest,
        cancel: &CancelSignal,
        on_event: &mut dyn FnMut(ChatStreamEvent),
    ) -> Result<Option<FinishReason>, OpenAiChatError>;
}

#[derive(Debug)]
struct DefaultStreamClient {
    client: OpenAiChatClient,
}

impl StreamClient for DefaultStreamClient {
    fn stream(
        &self,
        request: &ChatCompletionRequest,
        cancel: &CancelSignal,
        on_event: &mut dyn FnMut(ChatStreamEvent),
    ) -> Result<Option<FinishReason>, OpenAiChatError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                OpenAiChatError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime.block_on(
            self.client
                .stream_with_handler(request, Some(cancel), |event| on_event(event)),
        )
    }
}

#[derive(Debug, Default)]
struct PendingToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Outcome of one streamed round.
#[derive(Debug, Default)]
struct Round {
    text: String,
    tool_calls: BTreeMap<u32, PendingToolCall>,
}

impl Round {
    fn absorb_tool_delta(
        &mut self,
        index: u32,
        id: Option<String>,
        name: Option<String>,
        arguments: Option<String>,
    ) {
        let call = self.tool_calls.entry(index).or_default();
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            call.id = id;
        }
        if let Some(name) = name {
            call.name.push_str(&name);
        }
        if let Some(arguments) = arguments {
            call.arguments.push_str(&arguments);
        }
    }
}

/// `ChatRuntime` adapter backed by `openai_chat_api` transport primitives.
pub struct OpenAiChatRuntime {
    model: String,
    stream_client: Arc<dyn StreamClient>,
}

impl OpenAiChatRuntime {
    pub fn new(config: OpenAiRuntimeConfig) -> Result<Self, RuntimeInitError> {
        let model = sanitize_model(&config.model);
        let client = OpenAiChatClient::new(config.into_client_config()).map_err(map_init_error)?;

        Ok(Self {
            model,
            stream_client: Arc::new(DefaultStreamClient { client }),
        })
    }

    #[cfg(test)]
    fn with_stream_client_for_tests(model: &str, stream_client: Arc<dyn StreamClient>) -> Self {
        Self {
            model: sanitize_model(model),
            stream_client,
        }
    }

    fn stream_round(
        &self,
        run_id: u64,
        request: &ChatCompletionRequest,
        cancel: &CancelSignal,
        emit: &mut dyn FnMut(RunEvent),
    ) -> Result<(Round, Option<FinishReason>), OpenAiChatError> {
        let mut round = Round::default();
        let finish_reason = self.stream_client.stream(request, cancel, &mut |event| match event {
            ChatStreamEvent::ContentDelta { delta } => {
                round.text.push_str(&delta);
                emit(RunEvent::TextDelta { run_id, text: delta });
            }
            ChatStreamEvent::ReasoningDelta { delta } => {
                emit(RunEvent::ReasoningDelta { run_id, text: delta });
            }
            ChatStreamEvent::ToolCallDelta {
                index,
                id,
                name,
                arguments,
            } => round.absorb_tool_delta(index, id, name, arguments),
            ChatStreamEvent::Finished { .. } | ChatStreamEvent::Error { .. } => {}
        })?;

        Ok((round, finish_reason))
    }

    /// Executes one round's tool calls and appends the assistant call message plus
    /// one tool message per result. Returns false when cancelled mid-way.
    fn run_tool_calls(
        run_id: u64,
        round_index: usize,
        round: Round,
        messages: &mut Vec<ChatMessage>,
        cancel: &CancelSignal,
        execute_tool: &mut dyn FnMut(ToolCallRequest) -> ToolResult,
        emit: &mut dyn FnMut(RunEvent),
    ) -> bool {
        let calls: Vec<ChatToolCall> = round
            .tool_calls
            .into_iter()
            .map(|(index, call)| {
                let id = if call.id.is_empty() {
                    format!("call_{run_id}_{round_index}_{index}")
                } else {
                    call.id
                };
                ChatToolCall::function(id, call.name, call.arguments)
            })
            .collect();

        messages.push(ChatMessage::Assistant {
            content: (!round.text.is_empty()).then_some(round.text),
            tool_calls: calls.clone(),
        });

        for call in calls {
            let call_id = call.id;
            let tool_name = call.function.name;
            let result = match parse_arguments(&call.function.arguments) {
                Ok(arguments) => {
                    emit(RunEvent::ToolCallStarted {
                        run_id,
                        call_id: call_id.clone(),
                        tool_name: tool_name.clone(),
                        arguments: arguments.clone(),
                    });
                    execute_tool(ToolCallRequest {
                        call_id: call_id.clone(),
                        tool_name: tool_name.clone(),
                        arguments,
                    })
                }
                Err(message) => {
                    tracing::warn!(%tool_name, %message, "model sent unparseable tool arguments");
                    emit(RunEvent::ToolCallStarted {
                        run_id,
                        call_id: call_id.clone(),
                        tool_name: tool_name.clone(),
                        arguments: Value::String(call.function.arguments),
                    });
                    ToolResult::error(call_id.clone(), tool_name.clone(), message)
                }
            };

            messages.push(ChatMessage::Tool {
                tool_call_id: call_id,
                content: tool_content(&result.content),
            });
            emit(RunEvent::ToolCallFinished {
                run_id,
                call_id: result.call_id,
                tool_name: result.tool_name,
                is_error: result.is_error,
                content: result.content,
            });

            if cancel.load(Ordering::Acquire) {
                return false;
            }
        }

        true
    }
}

impl ChatRuntime for OpenAiChatRuntime {
    fn profile(&self) -> RuntimeProfile {
        RuntimeProfile {
            runtime_id: OPENAI_RUNTIME_ID.to_string(),
            model_id: self.model.clone(),
        }
    }

    fn run(
        &self,
        req: RunRequest,
        cancel: CancelSignal,
        execute_tool: &mut dyn FnMut(ToolCallRequest) -> ToolResult,
        emit: &mut dyn FnMut(RunEvent),
    ) -> Result<(), String> {
        let run_id = req.run_id;

        emit(RunEvent::Started { run_id });

        if cancel.load(Ordering::Acquire) {
            emit(RunEvent::Cancelled { run_id });
            return Ok(());
        }

        let tools = chat_tools(&req.tools);
        let mut messages = chat_messages(&req.instructions, &req.messages);

        for round_index in 0..=MAX_TOOL_ROUNDS {
            let request =
                ChatCompletionRequest::new(self.model.clone(), messages.clone()).with_tools(tools.clone());

            let (round, finish_reason) = match self.stream_round(run_id, &request, &cancel, emit) {
                Ok(outcome) => outcome,
                Err(OpenAiChatError::Cancelled) => {
                    emit(RunEvent::Cancelled { run_id });
                    return Ok(());
                }
                Err(error) => {
                    emit(RunEvent::Failed {
                        run_id,
                        error: format!("OpenAI request failed: {error}"),
                    });
                    return Ok(());
                }
            };

            if cancel.load(Ordering::Acquire) {
                emit(RunEvent::Cancelled { run_id });
                return Ok(());
            }

            if !round.tool_calls.is_empty() {
                if round_index == MAX_TOOL_ROUNDS {
                    emit(RunEvent::Failed {
                        run_id,
                        error: format!("model requested tools after {MAX_TOOL_ROUNDS} tool rounds"),
                    });
                    return Ok(());
                }

                tracing::debug!(run_id, round_index, calls = round.tool_calls.len(), "executing tool round");
                if !Self::run_tool_calls(
                    run_id,
                    round_index,
                    round,
                    &mut messages,
                    &cancel,
                    execute_tool,
                    emit,
                ) {
                    emit(RunEvent::Cancelled { run_id });
                    return Ok(());
                }
                continue;
            }

            emit_terminal_event(run_id, finish_reason, emit);
            return Ok(());
        }

        Ok(())
    }
}

fn emit_terminal_event(
    run_id: u64,
    finish_reason: Option<FinishReason>,
    emit: &mut dyn FnMut(RunEvent),
) {
    match finish_reason {
        Some(FinishReason::Stop) => emit(RunEvent::Finished { run_id }),
        Some(FinishReason::Length) => {
            tracing::warn!(run_id, "reply truncated at the model's token limit");
            emit(RunEvent::Finished { run_id });
        }
        Some(FinishReason::ContentFilter) => emit(RunEvent::Failed {
            run_id,
            error: "OpenAI response was blocked by the content filter".to_string(),
        }),
        Some(FinishReason::ToolCalls) => emit(RunEvent::Failed {
            run_id,
            error: "OpenAI response requested tools without sending any tool call".to_string(),
        }),
        Some(FinishReason::Other(reason)) => {
            tracing::debug!(run_id, %reason, "unrecognized finish reason");
            emit(RunEvent::Finished { run_id });
        }
        None => emit(RunEvent::Failed {
            run_id,
            error: "OpenAI stream ended without a finish reason".to_string(),
        }),
    }
}

fn chat_tools(tools: &[ToolDefinition]) -> Vec<ChatTool> {
    tools
        .iter()
        .map(|tool| {
            ChatTool::function(
                tool.name.clone(),
                tool.description.clone(),
                tool.input_schema.clone(),
            )
        })
        .collect()
}

/// Maps runtime history to Chat Completions messages. Consecutive tool calls
/// attach to the preceding assistant message until a tool result intervenes.
fn chat_messages(instructions: &str, history: &[RunMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    if !instructions.trim().is_empty() {
        messages.push(ChatMessage::system(instructions));
    }

    for item in history {
        match item {
            RunMessage::UserText { text } => messages.push(ChatMessage::user(text.clone())),
            RunMessage::AssistantText { text } => {
                messages.push(ChatMessage::assistant(text.clone()));
            }
            RunMessage::ToolCall {
                call_id,
                tool_name,
                arguments,
            } => {
                let call = ChatToolCall::function(
                    call_id.clone(),
                    tool_name.clone(),
                    arguments.to_string(),
                );
                match messages.last_mut() {
                    Some(ChatMessage::Assistant { tool_calls, .. }) => tool_calls.push(call),
                    _ => messages.push(ChatMessage::Assistant {
                        content: None,
                        tool_calls: vec![call],
                    }),
                }
            }
            RunMessage::ToolResult {
                call_id, content, ..
            } => messages.push(ChatMessage::Tool {
                tool_call_id: call_id.clone(),
                content: tool_content(content),
            }),
        }
    }

    messages
}

fn parse_arguments(raw: &str) -> Result<Value, String> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(raw).map_err(|error| format!("invalid tool arguments: {error}"))
}

fn tool_content(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn sanitize_model(model: &str) -> String {
    match model.trim() {
        "" => DEFAULT_MODEL.to_string(),
        value => value.to_string(),
    }
}

fn map_init_error(error: OpenAiChatError) -> RuntimeInitError {
    RuntimeInitError::new(format!("Failed to initialize openai runtime: {error}"))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicBool;
    use std::sync::{Mutex, MutexGuard};

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    type ScriptedRound = Result<(Vec<ChatStreamEvent>, Option<FinishReason>), OpenAiChatError>;

    struct FakeStreamClient {
        rounds: Mutex<VecDeque<ScriptedRound>>,
        requests: Mutex<Vec<ChatCompletionRequest>>,
    }

    impl FakeStreamClient {
        fn scripted(rounds: Vec<ScriptedRound>) -> Arc<Self> {
            Arc::new(Self {
                rounds: Mutex::new(rounds.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<ChatCompletionRequest> {
            lock(&self.requests).clone()
        }
    }

    impl StreamClient for FakeStreamClient {
        fn stream(
            &self,
            request: &ChatCompletionRequest,
            _cancel: &CancelSignal,
            on_event: &mut dyn FnMut(ChatStreamEvent),
        ) -> Result<Option<FinishReason>, OpenAiChatError> {
            lock(&self.requests).push(request.clone());
            let (events, finish_reason) = lock(&self.rounds)
                .pop_front()
                .expect("fake stream should have a scripted round")?;
            for event in events {
                on_event(event);
            }
            Ok(finish_reason)
        }
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().expect("test mutex should not be poisoned")
    }

    fn content(delta: &str) -> ChatStreamEvent {
        ChatStreamEvent::ContentDelta {
            delta: delta.to_string(),
        }
    }

    fn tool_delta(index: u32, id: Option<&str>, name: Option<&str>, arguments: &str) -> ChatStreamEvent {
        ChatStreamEvent::ToolCallDelta {
            index,
            id: id.map(ToString::to_string),
            name: name.map(ToString::to_string),
            arguments: Some(arguments.to_string()),
        }
    }

    fn search_round() -> ScriptedRound {
        Ok((
            vec![
                tool_delta(0, Some("call_1"), Some("searchVectorDatabase"), "{\"query\":"),
                tool_delta(0, None, None, "\"factory licence\"}"),
            ],
            Some(FinishReason::ToolCalls),
        ))
    }

    fn request() -> RunRequest {
        RunRequest {
            run_id: 9,
            messages: vec![RunMessage::UserText {
                text: "Do I need a factory license?".to_string(),
            }],
            instructions: "You are CompliBot.".to_string(),
            tools: vec![ToolDefinition {
                name: "searchVectorDatabase".to_string(),
                description: Some("Search the vector database".to_string()),
                input_schema: json!({"type": "object"}),
            }],
        }
    }

    fn run_with(
        runtime: &OpenAiChatRuntime,
        cancel: CancelSignal,
        calls: &mut Vec<ToolCallRequest>,
    ) -> Vec<RunEvent> {
        let mut events = Vec::new();
        runtime
            .run(
                request(),
                cancel,
                &mut |call| {
                    calls.push(call.clone());
                    ToolResult::success(call.call_id, call.tool_name, json!({"hits": ["licence"]}))
                },
                &mut |event| events.push(event),
            )
            .expect("run should not return runtime-level failure");
        events
    }

    fn not_cancelled() -> CancelSignal {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn profile_reports_openai_runtime_and_default_model() {
        let runtime =
            OpenAiChatRuntime::with_stream_client_for_tests(" ", FakeStreamClient::scripted(Vec::new()));
        let profile = runtime.profile();
        assert_eq!(profile.runtime_id, OPENAI_RUNTIME_ID);
        assert_eq!(profile.model_id, DEFAULT_MODEL);
    }

    #[test]
    fn text_round_maps_to_deltas_and_finished() {
        let stream = FakeStreamClient::scripted(vec![Ok((
            vec![
                ChatStreamEvent::ReasoningDelta {
                    delta: "thinking".to_string(),
                },
                content("Yes"),
                content("."),
            ],
            Some(FinishReason::Stop),
        ))]);
        let runtime = OpenAiChatRuntime::with_stream_client_for_tests(
            "gpt-4o-mini",
            Arc::clone(&stream) as Arc<dyn StreamClient>,
        );
        let mut calls = Vec::new();

        let events = run_with(&runtime, not_cancelled(), &mut calls);

        assert_eq!(
            events,
            vec![
                RunEvent::Started { run_id: 9 },
                RunEvent::ReasoningDelta {
                    run_id: 9,
                    text: "thinking".to_string()
                },
                RunEvent::TextDelta {
                    run_id: 9,
                    text: "Yes".to_string()
                },
                RunEvent::TextDelta {
                    run_id: 9,
                    text: ".".to_string()
                },
                RunEvent::Finished { run_id: 9 },
            ]
        );
        assert!(calls.is_empty());

        let requests = stream.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0], ChatMessage::system("You are CompliBot."));
        assert_eq!(requests[0].tools.len(), 1);
    }

    #[test]
    fn tool_round_executes_call_and_continues_with_results() {
        let stream = FakeStreamClient::scripted(vec![
            search_round(),
            Ok((vec![content("Answer")], Some(FinishReason::Stop))),
        ]);
        let runtime = OpenAiChatRuntime::with_stream_client_for_tests(
            "gpt-4o-mini",
            Arc::clone(&stream) as Arc<dyn StreamClient>,
        );
        let mut calls = Vec::new();

        let events = run_with(&runtime, not_cancelled(), &mut calls);

        assert_eq!(
            calls,
            vec![ToolCallRequest {
                call_id: "call_1".to_string(),
                tool_name: "searchVectorDatabase".to_string(),
                arguments: json!({"query": "factory licence"}),
            }]
        );
        assert!(events.iter().any(|event| matches!(
            event,
            RunEvent::ToolCallFinished { call_id, is_error: false, .. } if call_id == "call_1"
        )));
        assert!(matches!(events.last(), Some(RunEvent::Finished { run_id: 9 })));

        let requests = stream.requests();
        assert_eq!(requests.len(), 2);
        let follow_up = &requests[1].messages;
        assert_eq!(
            follow_up[follow_up.len() - 2],
            ChatMessage::Assistant {
                content: None,
                tool_calls: vec![ChatToolCall::function(
                    "call_1",
                    "searchVectorDatabase",
                    "{\"query\":\"factory licence\"}"
                )],
            }
        );
        assert_eq!(
            follow_up[follow_up.len() - 1],
            ChatMessage::Tool {
                tool_call_id: "call_1".to_string(),
                content: "{\"hits\":[\"licence\"]}".to_string(),
            }
        );
    }

    #[test]
    fn malformed_tool_arguments_become_error_results_without_execution() {
        let stream = FakeStreamClient::scripted(vec![
            Ok((
                vec![tool_delta(0, Some("call_x"), Some("searchVectorDatabase"), "{oops")],
                Some(FinishReason::ToolCalls),
            )),
            Ok((vec![content("Sorry")], Some(FinishReason::Stop))),
        ]);
        let runtime = OpenAiChatRuntime::with_stream_client_for_tests("m", stream);
        let mut calls = Vec::new();

        let events = run_with(&runtime, not_cancelled(), &mut calls);

        assert!(calls.is_empty());
        assert!(events.iter().any(|event| matches!(
            event,
            RunEvent::ToolCallFinished { is_error: true, .. }
        )));
        assert!(matches!(events.last(), Some(RunEvent::Finished { .. })));
    }

    #[test]
    fn tool_rounds_are_bounded() {
        let rounds = (0..=MAX_TOOL_ROUNDS).map(|_| search_round()).collect();
        let runtime = OpenAiChatRuntime::with_stream_client_for_tests("m", FakeStreamClient::scripted(rounds));
        let mut calls = Vec::new();

        let events = run_with(&runtime, not_cancelled(), &mut calls);

        assert_eq!(calls.len(), MAX_TOOL_ROUNDS);
        assert!(matches!(
            events.last(),
            Some(RunEvent::Failed { error, .. }) if error.contains("tool rounds")
        ));
    }

    #[test]
    fn cancelled_transport_maps_to_cancelled_event() {
        let runtime = OpenAiChatRuntime::with_stream_client_for_tests(
            "m",
            FakeStreamClient::scripted(vec![Err(OpenAiChatError::Cancelled)]),
        );
        let mut calls = Vec::new();

        let events = run_with(&runtime, not_cancelled(), &mut calls);

        assert_eq!(
            events,
            vec![RunEvent::Started { run_id: 9 }, RunEvent::Cancelled { run_id: 9 }]
        );
    }

    #[test]
    fn pre_cancelled_run_never_streams() {
        let stream = FakeStreamClient::scripted(Vec::new());
        let runtime =
            OpenAiChatRuntime::with_stream_client_for_tests("m", Arc::clone(&stream) as Arc<dyn StreamClient>);
        let mut calls = Vec::new();

        let events = run_with(&runtime, Arc::new(AtomicBool::new(true)), &mut calls);

        assert_eq!(
            events,
            vec![RunEvent::Started { run_id: 9 }, RunEvent::Cancelled { run_id: 9 }]
        );
        assert!(stream.requests().is_empty());
    }

    #[test]
    fn transport_error_maps_to_failed_event() {
        let runtime = OpenAiChatRuntime::with_stream_client_for_tests(
            "m",
            FakeStreamClient::scripted(vec![Err(OpenAiChatError::Unknown("boom".to_string()))]),
        );
        let mut calls = Vec::new();

        let events = run_with(&runtime, not_cancelled(), &mut calls);

        assert!(matches!(
            events.last(),
            Some(RunEvent::Failed { run_id: 9, error }) if error.contains("boom")
        ));
    }

    #[test]
    fn missing_finish_reason_maps_to_failed_event() {
        let runtime = OpenAiChatRuntime::with_stream_client_for_tests(
            "m",
            FakeStreamClient::scripted(vec![Ok((vec![content("partial")], None))]),
        );
        let mut calls = Vec::new();

        let events = run_with(&runtime, not_cancelled(), &mut calls);

        assert!(matches!(events.last(), Some(RunEvent::Failed { .. })));
    }

    #[test]
    fn history_groups_tool_calls_after_assistant_text() {
        let messages = chat_messages(
            "",
            &[
                RunMessage::UserText {
                    text: "q".to_string(),
                },
                RunMessage::AssistantText {
                    text: "Let me check.".to_string(),
                },
                RunMessage::ToolCall {
                    call_id: "c1".to_string(),
                    tool_name: "searchVectorDatabase".to_string(),
                    arguments: json!({"query": "q"}),
                },
                RunMessage::ToolResult {
                    call_id: "c1".to_string(),
                    tool_name: "searchVectorDatabase".to_string(),
                    content: json!("index unavailable"),
                    is_error: true,
                },
                RunMessage::AssistantText {
                    text: "Done.".to_string(),
                },
            ],
        );

        assert_eq!(
            messages,
            vec![
                ChatMessage::user("q"),
                ChatMessage::Assistant {
                    content: Some("Let me check.".to_string()),
                    tool_calls: vec![ChatToolCall::function(
                        "c1",
                        "searchVectorDatabase",
                        "{\"query\":\"q\"}"
                    )],
                },
                ChatMessage::Tool {
                    tool_call_id: "c1".to_string(),
                    content: "index unavailable".to_string(),
                },
                ChatMessage::assistant("Done."),
            ]
        );
    }
}
