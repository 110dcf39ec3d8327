//! Live conversation state and its chat-runtime lifecycle.
//!
//! The session owns the message list and the duration map. Runtime events are
//! folded in one at a time by [`ConversationSession::apply_run_event`]; every
//! mutation bumps [`ConversationSession::revision`], which is what persistence
//! watches.

use std::fmt;
use std::time::Instant;

use chat_runtime::{
    run_history, DurationKey, DurationMap, MessagePart, Role, RunEvent, RunId, RunMessage,
    ToolCallState, UiMessage,
};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::validation::{validate_message, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatStatus {
    Ready,
    Submitted,
    Streaming,
    Error,
}

impl ChatStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Submitted => "submitted",
            Self::Streaming => "streaming",
            Self::Error => "error",
        }
    }

    /// True while a reply is in flight.
    #[must_use]
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Submitted | Self::Streaming)
    }
}

impl fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side effects the session needs from its host.
pub trait HostOps {
    fn start_run(
        &mut self,
        messages: Vec<RunMessage>,
        instructions: String,
    ) -> Result<RunId, String>;
    fn cancel_run(&mut self, run_id: RunId);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("a reply is already in progress")]
    Busy,
    #[error("failed to start reply: {0}")]
    Start(String),
}

#[derive(Debug, Clone)]
struct ReasoningTimer {
    key: DurationKey,
    started_at: Instant,
}

#[derive(Debug, Clone)]
pub struct ConversationSession {
    messages: Vec<UiMessage>,
    durations: DurationMap,
    status: ChatStatus,
    last_error: Option<String>,
    instructions: String,
    active_run: Option<RunId>,
    reply_index: Option<usize>,
    reasoning: Option<ReasoningTimer>,
    revision: u64,
}

impl ConversationSession {
    #[must_use]
    pub fn new(messages: Vec<UiMessage>, instructions: impl Into<String>) -> Self {
        Self {
            messages,
            durations: DurationMap::new(),
            status: ChatStatus::Ready,
            last_error: None,
            instructions: instructions.into(),
            active_run: None,
            reply_index: None,
            reasoning: None,
            revision: 0,
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[UiMessage] {
        &self.messages
    }

    #[must_use]
    pub fn durations(&self) -> &DurationMap {
        &self.durations
    }

    #[must_use]
    pub fn status(&self) -> ChatStatus {
        self.status
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    #[must_use]
    pub fn active_run(&self) -> Option<RunId> {
        self.active_run
    }

    /// Counter bumped on every change to messages or durations.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True once the user has said something, or more than the welcome is shown.
    #[must_use]
    pub fn has_conversation(&self) -> bool {
        match self.messages.as_slice() {
            [] => false,
            [only] => only.role == Role::User,
            _ => true,
        }
    }

    /// Appends the user message and starts a streamed reply through `host`.
    pub fn send(&mut self, text: &str, host: &mut dyn HostOps) -> Result<RunId, SendError> {
        validate_message(text)?;
        if self.status.is_busy() {
            return Err(SendError::Busy);
        }

        self.messages.push(UiMessage::user_text(new_message_id(), text));
        let history = run_history(&self.messages);

        match host.start_run(history, self.instructions.clone()) {
            Ok(run_id) => {
                self.active_run = Some(run_id);
                self.reply_index = None;
                self.status = ChatStatus::Submitted;
                self.last_error = None;
                self.touch();
                tracing::debug!(run_id, "reply submitted");
                Ok(run_id)
            }
            Err(error) => {
                self.messages.pop();
                self.status = ChatStatus::Error;
                self.last_error = Some(error.clone());
                tracing::warn!(%error, "failed to start reply");
                Err(SendError::Start(error))
            }
        }
    }

    /// Cancels the in-flight reply. The partial reply stays in the list and any
    /// further events of that run are ignored. Returns false when idle.
    pub fn stop(&mut self, host: &mut dyn HostOps) -> bool {
        self.stop_at(host, Instant::now())
    }

    fn stop_at(&mut self, host: &mut dyn HostOps, now: Instant) -> bool {
        let Some(run_id) = self.active_run.take() else {
            return false;
        };

        host.cancel_run(run_id);
        self.finish_reasoning(now);
        self.reply_index = None;
        self.status = ChatStatus::Ready;
        tracing::debug!(run_id, "reply stopped");
        true
    }

    pub fn record_duration(&mut self, message_id: &str, part_index: usize, elapsed_ms: u64) {
        self.durations
            .record(&DurationKey::new(message_id, part_index), elapsed_ms);
        self.touch();
    }

    #[must_use]
    pub fn duration(&self, message_id: &str, part_index: usize) -> Option<u64> {
        self.durations.get(&DurationKey::new(message_id, part_index))
    }

    /// Replaces the conversation with `welcome` alone, stopping any in-flight
    /// reply first.
    pub fn clear_conversation(&mut self, welcome: UiMessage, host: &mut dyn HostOps) {
        self.stop(host);
        self.messages = vec![welcome];
        self.durations.clear();
        self.reasoning = None;
        self.status = ChatStatus::Ready;
        self.last_error = None;
        self.touch();
    }

    pub fn set_messages(&mut self, messages: Vec<UiMessage>) {
        self.messages = messages;
        self.reply_index = None;
        self.touch();
    }

    pub fn set_durations(&mut self, durations: DurationMap) {
        self.durations = durations;
        self.touch();
    }

    /// Folds one runtime event into the live state. Returns false when the event
    /// belongs to a run that is no longer active.
    pub fn apply_run_event(&mut self, event: RunEvent, now: Instant) -> bool {
        if self.active_run != Some(event.run_id()) {
            tracing::trace!(run_id = event.run_id(), "ignoring event of inactive run");
            return false;
        }

        match event {
            RunEvent::Started { .. } => return true,
            RunEvent::TextDelta { text, .. } => {
                self.finish_reasoning(now);
                let reply = self.reply_mut();
                match reply.parts.last_mut() {
                    Some(MessagePart::Text { text: existing }) => existing.push_str(&text),
                    _ => reply.parts.push(MessagePart::Text { text }),
                }
            }
            RunEvent::ReasoningDelta { text, .. } => self.push_reasoning(&text, now),
            RunEvent::ToolCallStarted {
                call_id,
                tool_name,
                arguments,
                ..
            } => {
                self.finish_reasoning(now);
                self.reply_mut().parts.push(MessagePart::Tool {
                    tool_call_id: call_id,
                    tool_name,
                    state: ToolCallState::InputAvailable,
                    input: Some(arguments),
                    output: None,
                    error_text: None,
                });
            }
            RunEvent::ToolCallFinished {
                call_id,
                tool_name,
                is_error,
                content,
                ..
            } => {
                self.finish_reasoning(now);
                self.finish_tool_part(call_id, tool_name, is_error, content);
            }
            RunEvent::Finished { run_id } => {
                self.finish_reasoning(now);
                self.end_run(ChatStatus::Ready, None);
                tracing::debug!(run_id, "reply finished");
            }
            RunEvent::Failed { run_id, error } => {
                self.finish_reasoning(now);
                tracing::warn!(run_id, %error, "reply failed");
                self.end_run(ChatStatus::Error, Some(error));
            }
            RunEvent::Cancelled { run_id } => {
                self.finish_reasoning(now);
                self.end_run(ChatStatus::Ready, None);
                tracing::debug!(run_id, "reply cancelled");
            }
        }

        self.touch();
        true
    }

    fn end_run(&mut self, status: ChatStatus, error: Option<String>) {
        self.active_run = None;
        self.reply_index = None;
        self.status = status;
        self.last_error = error;
    }

    /// Returns the assistant message of the active run, creating it on first use.
    fn reply_mut(&mut self) -> &mut UiMessage {
        self.status = ChatStatus::Streaming;
        let index = match self.reply_index {
            Some(index) if index < self.messages.len() => index,
            _ => {
                self.messages.push(UiMessage {
                    id: new_message_id(),
                    role: Role::Assistant,
                    parts: Vec::new(),
                });
                let index = self.messages.len() - 1;
                self.reply_index = Some(index);
                index
            }
        };
        &mut self.messages[index]
    }

    fn push_reasoning(&mut self, delta: &str, now: Instant) {
        let reply = self.reply_mut();
        if let Some(MessagePart::Reasoning { text, .. }) = reply.parts.last_mut() {
            text.push_str(delta);
            return;
        }

        reply.parts.push(MessagePart::Reasoning {
            text: delta.to_string(),
            elapsed_ms: None,
        });
        let key = DurationKey::new(reply.id.clone(), reply.parts.len() - 1);
        self.reasoning = Some(ReasoningTimer {
            key,
            started_at: now,
        });
    }

    /// Closes the open reasoning part, recording its duration and mirroring it
    /// into the part's `elapsedMs`.
    fn finish_reasoning(&mut self, now: Instant) {
        let Some(timer) = self.reasoning.take() else {
            return;
        };

        let elapsed = now.saturating_duration_since(timer.started_at).as_millis();
        let elapsed_ms = u64::try_from(elapsed).unwrap_or(u64::MAX);
        self.durations.record(&timer.key, elapsed_ms);

        let part = self
            .messages
            .iter_mut()
            .find(|message| message.id == timer.key.message_id)
            .and_then(|message| message.parts.get_mut(timer.key.part_index));
        if let Some(MessagePart::Reasoning {
            elapsed_ms: slot, ..
        }) = part
        {
            *slot = Some(elapsed_ms);
        }
    }

    fn finish_tool_part(
        &mut self,
        call_id: String,
        tool_name: String,
        is_error: bool,
        content: Value,
    ) {
        let (state, output, error_text) = if is_error {
            let error_text = match content {
                Value::String(text) => text,
                other => other.to_string(),
            };
            (ToolCallState::OutputError, None, Some(error_text))
        } else {
            (ToolCallState::OutputAvailable, Some(content), None)
        };

        let reply = self.reply_mut();
        let existing = reply.parts.iter_mut().find(|part| {
            matches!(part, MessagePart::Tool { tool_call_id, .. } if *tool_call_id == call_id)
        });

        match existing {
            Some(MessagePart::Tool {
                state: slot_state,
                output: slot_output,
                error_text: slot_error,
                ..
            }) => {
                *slot_state = state;
                *slot_output = output;
                *slot_error = error_text;
            }
            _ => reply.parts.push(MessagePart::Tool {
                tool_call_id: call_id,
                tool_name,
                state,
                input: None,
                output,
                error_text,
            }),
        }
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct HostSpy {
        next_run_id: RunId,
        started: Vec<(Vec<RunMessage>, String)>,
        cancelled: Vec<RunId>,
        fail_start: Option<String>,
    }

    impl HostOps for HostSpy {
        fn start_run(
            &mut self,
            messages: Vec<RunMessage>,
            instructions: String,
        ) -> Result<RunId, String> {
            if let Some(error) = self.fail_start.clone() {
                return Err(error);
            }
            self.next_run_id += 1;
            self.started.push((messages, instructions));
            Ok(self.next_run_id)
        }

        fn cancel_run(&mut self, run_id: RunId) {
            self.cancelled.push(run_id);
        }
    }

    fn session() -> ConversationSession {
        ConversationSession::new(
            vec![UiMessage::assistant_text("welcome-1", "Hello!")],
            "system prompt",
        )
    }

    fn text(run_id: RunId, text: &str) -> RunEvent {
        RunEvent::TextDelta {
            run_id,
            text: text.to_string(),
        }
    }

    fn reasoning(run_id: RunId, text: &str) -> RunEvent {
        RunEvent::ReasoningDelta {
            run_id,
            text: text.to_string(),
        }
    }

    #[test]
    fn send_appends_literal_user_text_and_starts_a_run() {
        let mut session = session();
        let mut host = HostSpy::default();

        let run_id = session
            .send("Do I need a factory license?", &mut host)
            .expect("send succeeds");

        assert_eq!(session.messages().len(), 2);
        let sent = &session.messages()[1];
        assert_eq!(sent.role, Role::User);
        assert_eq!(sent.parts, vec![MessagePart::text("Do I need a factory license?")]);
        assert_eq!(session.status(), ChatStatus::Submitted);
        assert_eq!(session.active_run(), Some(run_id));

        let (history, instructions) = &host.started[0];
        assert_eq!(instructions, "system prompt");
        assert_eq!(
            history.last(),
            Some(&RunMessage::UserText {
                text: "Do I need a factory license?".to_string()
            })
        );
    }

    #[test]
    fn invalid_or_busy_sends_are_rejected() {
        let mut session = session();
        let mut host = HostSpy::default();

        assert_eq!(
            session.send("   ", &mut host),
            Err(SendError::Invalid(ValidationError::Empty))
        );
        session.send("first", &mut host).expect("send succeeds");
        assert_eq!(session.send("second", &mut host), Err(SendError::Busy));
        assert_eq!(host.started.len(), 1);
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn failed_start_rolls_back_the_user_message() {
        let mut session = session();
        let mut host = HostSpy {
            fail_start: Some("worker unavailable".to_string()),
            ..HostSpy::default()
        };
        let revision = session.revision();

        assert_eq!(
            session.send("hello", &mut host),
            Err(SendError::Start("worker unavailable".to_string()))
        );
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.status(), ChatStatus::Error);
        assert_eq!(session.last_error(), Some("worker unavailable"));
        assert_eq!(session.revision(), revision);
    }

    #[test]
    fn streamed_events_build_one_assistant_message() {
        let mut session = session();
        let mut host = HostSpy::default();
        let run_id = session.send("fire NOC?", &mut host).expect("send succeeds");
        let start = Instant::now();

        assert!(session.apply_run_event(RunEvent::Started { run_id }, start));
        assert_eq!(session.status(), ChatStatus::Submitted);

        session.apply_run_event(reasoning(run_id, "Checking "), start);
        session.apply_run_event(reasoning(run_id, "state rules."), start);
        assert_eq!(session.status(), ChatStatus::Streaming);
        session.apply_run_event(
            RunEvent::ToolCallStarted {
                run_id,
                call_id: "call-1".to_string(),
                tool_name: "searchVectorDatabase".to_string(),
                arguments: json!({"query": "fire NOC"}),
            },
            start + Duration::from_millis(1200),
        );
        session.apply_run_event(
            RunEvent::ToolCallFinished {
                run_id,
                call_id: "call-1".to_string(),
                tool_name: "searchVectorDatabase".to_string(),
                is_error: false,
                content: json!({"result": {"hits": []}}),
            },
            start + Duration::from_millis(1300),
        );
        session.apply_run_event(text(run_id, "Yes, "), start);
        session.apply_run_event(text(run_id, "you do."), start);
        session.apply_run_event(RunEvent::Finished { run_id }, start);

        assert_eq!(session.status(), ChatStatus::Ready);
        assert_eq!(session.active_run(), None);
        let reply = session.messages().last().expect("assistant reply");
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(
            reply.parts,
            vec![
                MessagePart::Reasoning {
                    text: "Checking state rules.".to_string(),
                    elapsed_ms: Some(1200),
                },
                MessagePart::Tool {
                    tool_call_id: "call-1".to_string(),
                    tool_name: "searchVectorDatabase".to_string(),
                    state: ToolCallState::OutputAvailable,
                    input: Some(json!({"query": "fire NOC"})),
                    output: Some(json!({"result": {"hits": []}})),
                    error_text: None,
                },
                MessagePart::text("Yes, you do."),
            ]
        );
        assert_eq!(session.duration(&reply.id, 0), Some(1200));
    }

    #[test]
    fn failed_tool_call_keeps_error_text() {
        let mut session = session();
        let mut host = HostSpy::default();
        let run_id = session.send("q", &mut host).expect("send succeeds");
        let now = Instant::now();

        session.apply_run_event(
            RunEvent::ToolCallFinished {
                run_id,
                call_id: "call-2".to_string(),
                tool_name: "searchVectorDatabase".to_string(),
                is_error: true,
                content: json!("vector search is not configured"),
            },
            now,
        );

        let reply = session.messages().last().expect("assistant reply");
        assert!(matches!(
            &reply.parts[0],
            MessagePart::Tool {
                state: ToolCallState::OutputError,
                error_text: Some(error),
                output: None,
                ..
            } if error == "vector search is not configured"
        ));
    }

    #[test]
    fn failure_sets_error_status_and_message() {
        let mut session = session();
        let mut host = HostSpy::default();
        let run_id = session.send("q", &mut host).expect("send succeeds");

        session.apply_run_event(
            RunEvent::Failed {
                run_id,
                error: "HTTP 429: rate limited".to_string(),
            },
            Instant::now(),
        );

        assert_eq!(session.status(), ChatStatus::Error);
        assert_eq!(session.last_error(), Some("HTTP 429: rate limited"));
        session.send("again", &mut host).expect("error status accepts a resend");
        assert_eq!(session.last_error(), None);
    }

    #[test]
    fn stop_keeps_partial_reply_and_ignores_late_events() {
        let mut session = session();
        let mut host = HostSpy::default();
        let run_id = session.send("q", &mut host).expect("send succeeds");
        session.apply_run_event(text(run_id, "Partial"), Instant::now());

        assert!(session.stop(&mut host));
        assert_eq!(host.cancelled, vec![run_id]);
        assert_eq!(session.status(), ChatStatus::Ready);

        let revision = session.revision();
        assert!(!session.apply_run_event(text(run_id, " late"), Instant::now()));
        assert!(!session.apply_run_event(RunEvent::Cancelled { run_id }, Instant::now()));
        assert_eq!(session.revision(), revision);
        assert_eq!(session.messages().last().map(UiMessage::text), Some("Partial".to_string()));
        assert!(!session.stop(&mut host));
    }

    #[test]
    fn stop_closes_an_open_reasoning_part() {
        let mut session = session();
        let mut host = HostSpy::default();
        let run_id = session.send("q", &mut host).expect("send succeeds");
        let start = Instant::now();
        session.apply_run_event(reasoning(run_id, "thinking"), start);

        session.stop_at(&mut host, start + Duration::from_millis(450));

        let reply = session.messages().last().expect("assistant reply");
        assert_eq!(session.duration(&reply.id, 0), Some(450));
        assert_eq!(
            reply.parts[0],
            MessagePart::Reasoning {
                text: "thinking".to_string(),
                elapsed_ms: Some(450),
            }
        );
    }

    #[test]
    fn recorded_durations_read_back_and_missing_keys_are_none() {
        let mut session = session();
        let revision = session.revision();

        session.record_duration("m1", 2, 1500);

        assert_eq!(session.duration("m1", 2), Some(1500));
        assert_eq!(session.duration("m1", 3), None);
        assert_eq!(session.duration("m2", 2), None);
        assert!(session.revision() > revision);
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn clear_stops_in_flight_reply_and_resets_state() {
        let mut session = session();
        let mut host = HostSpy::default();
        session.record_duration("welcome-1", 0, 10);
        let run_id = session.send("q", &mut host).expect("send succeeds");

        session.clear_conversation(UiMessage::assistant_text("welcome-2", "Fresh start."), &mut host);

        assert_eq!(host.cancelled, vec![run_id]);
        assert_eq!(
            session.messages(),
            &[UiMessage::assistant_text("welcome-2", "Fresh start.")]
        );
        assert!(session.durations().is_empty());
        assert_eq!(session.status(), ChatStatus::Ready);
        assert!(!session.has_conversation());
    }

    #[test]
    fn has_conversation_requires_a_user_turn_or_more_than_one_message() {
        let mut session = ConversationSession::new(Vec::new(), "");
        assert!(!session.has_conversation());

        session.set_messages(vec![UiMessage::assistant_text("welcome-1", "Hi")]);
        assert!(!session.has_conversation());

        session.set_messages(vec![UiMessage::user_text("u1", "Hi")]);
        assert!(session.has_conversation());

        session.set_messages(vec![
            UiMessage::assistant_text("a1", "Hi"),
            UiMessage::assistant_text("a2", "Again"),
        ]);
        assert!(session.has_conversation());
    }
}
