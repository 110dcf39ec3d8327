//! Deterministic mock implementation of the `chat_runtime` contract.
//!
//! No transport logic lives here. The mock streams an optional reasoning phase, an
//! optional retrieval tool call seeded with the latest user text, and then a scripted
//! answer token by token.

use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use chat_runtime::{
    CancelSignal, ChatRuntime, RunEvent, RunRequest, RuntimeProfile, ToolCallRequest, ToolResult,
};
use serde_json::json;

/// Stable runtime identifier used for explicit startup selection.
pub const MOCK_RUNTIME_ID: &str = "mock";

const RUN_DELAY: Duration = Duration::from_millis(200);
const TOKEN_DELAY: Duration = Duration::from_millis(40);

#[derive(Debug, Clone)]
pub struct MockRuntime {
    reasoning: Vec<String>,
    chunks: Vec<String>,
    search_tool: Option<String>,
    run_delay: Duration,
    token_delay: Duration,
}

impl MockRuntime {
    /// Creates a mock that streams `chunks` as its answer and nothing else.
    #[must_use]
    pub fn new(chunks: Vec<String>) -> Self {
        Self {
            reasoning: Vec::new(),
            chunks,
            search_tool: None,
            run_delay: RUN_DELAY,
            token_delay: TOKEN_DELAY,
        }
    }

    #[must_use]
    pub fn with_reasoning(mut self, reasoning: Vec<String>) -> Self {
        self.reasoning = reasoning;
        self
    }

    /// Calls the named tool with the latest user text before answering, when the run
    /// offers that tool.
    #[must_use]
    pub fn with_search_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.search_tool = Some(tool_name.into());
        self
    }

    #[must_use]
    pub fn with_delays(mut self, run_delay: Duration, token_delay: Duration) -> Self {
        self.run_delay = run_delay;
        self.token_delay = token_delay;
        self
    }

    fn pause(delay: Duration) {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    /// Streams `chunks` split on spaces/newlines. Returns false when cancelled.
    fn stream_tokens(
        &self,
        chunks: &[String],
        cancel: &CancelSignal,
        emit: &mut dyn FnMut(String),
    ) -> bool {
        for chunk in chunks {
            let mut pending_token = String::new();
            for ch in chunk.chars() {
                pending_token.push(ch);

                if matches!(ch, ' ' | '\n') {
                    if cancel.load(Ordering::SeqCst) {
                        return false;
                    }
                    emit(std::mem::take(&mut pending_token));
                    Self::pause(self.token_delay);
                }
            }

            if !pending_token.is_empty() {
                if cancel.load(Ordering::SeqCst) {
                    return false;
                }
                emit(pending_token);
                Self::pause(self.token_delay);
            }
        }

        !cancel.load(Ordering::SeqCst)
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new(vec![
            "Most units with 10 or more workers using power (20 without power) need a factory licence.\n".to_string(),
            "\n".to_string(),
            "Under the Factories Act, 1948 a factory employing 10+ workers with power, or 20+ without power, must register and obtain a licence from the state Chief Inspector of Factories before starting operations; fees depend on installed horsepower and headcount, and most states accept online applications with a building plan approval, a consent to establish from the pollution control board, and proof of ownership or lease. (This is general guidance, not legal advice.)\n".to_string(),
            "\n".to_string(),
            "Would you like a step-by-step checklist with the exact forms for your state?\n".to_string(),
        ])
        .with_reasoning(vec![
            "Checking worker-count thresholds under the Factories Act. ".to_string(),
            "Licence applies per premises.".to_string(),
        ])
    }
}

impl ChatRuntime for MockRuntime {
    fn profile(&self) -> RuntimeProfile {
        RuntimeProfile {
            runtime_id: MOCK_RUNTIME_ID.to_string(),
            model_id: "mock".to_string(),
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
        Self::pause(self.run_delay);

        if cancel.load(Ordering::SeqCst) {
            emit(RunEvent::Cancelled { run_id });
            return Ok(());
        }

        let completed = self.stream_tokens(&self.reasoning, &cancel, &mut |text| {
            emit(RunEvent::ReasoningDelta { run_id, text });
        });
        if !completed {
            emit(RunEvent::Cancelled { run_id });
            return Ok(());
        }

        if let Some(tool_name) = self.search_tool.as_deref() {
            if req.offers_tool(tool_name) {
                let call = ToolCallRequest {
                    call_id: format!("mock-call-{run_id}"),
                    tool_name: tool_name.to_string(),
                    arguments: json!({ "query": req.latest_user_text().unwrap_or_default() }),
                };

                emit(RunEvent::ToolCallStarted {
                    run_id,
                    call_id: call.call_id.clone(),
                    tool_name: call.tool_name.clone(),
                    arguments: call.arguments.clone(),
                });
                let result = execute_tool(call);
                emit(RunEvent::ToolCallFinished {
                    run_id,
                    call_id: result.call_id,
                    tool_name: result.tool_name,
                    is_error: result.is_error,
                    content: result.content,
                });

                if cancel.load(Ordering::SeqCst) {
                    emit(RunEvent::Cancelled { run_id });
                    return Ok(());
                }
            }
        }

        let completed = self.stream_tokens(&self.chunks, &cancel, &mut |text| {
            emit(RunEvent::TextDelta { run_id, text });
        });

        if completed {
            emit(RunEvent::Finished { run_id });
        } else {
            emit(RunEvent::Cancelled { run_id });
        }

        Ok(())
    }
}
