//! Provider-neutral contract between the chat client and an external chat runtime.
//!
//! The client owns the UI-facing conversation ([`UiMessage`]) and replays it to the
//! runtime as model-facing [`RunMessage`] history on every turn. The runtime streams
//! [`RunEvent`]s back and may synchronously ask the host to execute a tool. Transport
//! details (HTTP, SSE framing, auth) live in runtime implementations, not here.

use std::fmt;
use std::sync::{atomic::AtomicBool, Arc};

use serde_json::Value;

mod history;
mod message;

pub use history::run_history;
pub use message::{DurationKey, DurationMap, MessagePart, Role, ToolCallState, UiMessage};

/// Identifier for one runtime run.
pub type RunId = u64;

/// Shared cancellation flag for a run.
pub type CancelSignal = Arc<AtomicBool>;

/// Error returned while constructing/configuring a runtime before any run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInitError {
    message: String,
}

impl RuntimeInitError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RuntimeInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RuntimeInitError {}

impl From<String> for RuntimeInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for RuntimeInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Model-facing message history item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMessage {
    UserText {
        text: String,
    },
    AssistantText {
        text: String,
    },
    ToolCall {
        call_id: String,
        tool_name: String,
        arguments: Value,
    },
    ToolResult {
        call_id: String,
        tool_name: String,
        content: Value,
        is_error: bool,
    },
}

/// Host-mediated tool definition offered to the runtime for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Input required to start a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub run_id: RunId,
    pub messages: Vec<RunMessage>,
    pub instructions: String,
    pub tools: Vec<ToolDefinition>,
}

impl RunRequest {
    /// Returns the text of the most recent user message, if any.
    #[must_use]
    pub fn latest_user_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|message| match message {
            RunMessage::UserText { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Returns true when a tool with `name` is offered for this run.
    #[must_use]
    pub fn offers_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|tool| tool.name == name)
    }
}

/// Runtime request envelope for one host tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: Value,
}

/// Host tool call result returned back to the runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub call_id: String,
    pub tool_name: String,
    pub is_error: bool,
    pub content: Value,
}

impl ToolResult {
    #[must_use]
    pub fn success(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<Value>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            is_error: false,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn error(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<Value>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            is_error: true,
            content: content.into(),
        }
    }
}

/// Runtime-emitted lifecycle event for a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Started {
        run_id: RunId,
    },
    TextDelta {
        run_id: RunId,
        text: String,
    },
    ReasoningDelta {
        run_id: RunId,
        text: String,
    },
    ToolCallStarted {
        run_id: RunId,
        call_id: String,
        tool_name: String,
        arguments: Value,
    },
    ToolCallFinished {
        run_id: RunId,
        call_id: String,
        tool_name: String,
        is_error: bool,
        content: Value,
    },
    Finished {
        run_id: RunId,
    },
    Failed {
        run_id: RunId,
        error: String,
    },
    Cancelled {
        run_id: RunId,
    },
}

impl RunEvent {
    #[must_use]
    pub fn run_id(&self) -> RunId {
        match self {
            Self::Started { run_id }
            | Self::TextDelta { run_id, .. }
            | Self::ReasoningDelta { run_id, .. }
            | Self::ToolCallStarted { run_id, .. }
            | Self::ToolCallFinished { run_id, .. }
            | Self::Finished { run_id }
            | Self::Failed { run_id, .. }
            | Self::Cancelled { run_id } => *run_id,
        }
    }

    /// Returns true when this event terminates the run lifecycle.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Finished { .. } | Self::Failed { .. } | Self::Cancelled { .. }
        )
    }
}

/// Immutable metadata describing a chat runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeProfile {
    pub runtime_id: String,
    pub model_id: String,
}

/// External chat runtime executing one streamed assistant reply per run.
pub trait ChatRuntime: Send + Sync + 'static {
    fn profile(&self) -> RuntimeProfile;

    /// Executes a run request and emits lifecycle events in runtime order.
    ///
    /// Runtimes request host tool execution through `execute_tool`; the callback is
    /// serial from the caller's perspective. Implementations must emit exactly one
    /// terminal event unless they return `Err`.
    fn run(
        &self,
        req: RunRequest,
        cancel: CancelSignal,
        execute_tool: &mut dyn FnMut(ToolCallRequest) -> ToolResult,
        emit: &mut dyn FnMut(RunEvent),
    ) -> Result<(), String>;
}
