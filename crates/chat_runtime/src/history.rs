use serde_json::Value;

use crate::message::{MessagePart, Role, ToolCallState, UiMessage};
use crate::RunMessage;

/// Converts the UI conversation into model-facing run history.
///
/// Reasoning parts are not replayed. Tool parts replay as a call followed by its
/// result; calls that never produced output (for example a stopped reply) are skipped.
#[must_use]
pub fn run_history(messages: &[UiMessage]) -> Vec<RunMessage> {
    let mut history = Vec::new();

    for message in messages {
        match message.role {
            Role::User => {
                let text = message.text();
                if !text.is_empty() {
                    history.push(RunMessage::UserText { text });
                }
            }
            Role::Assistant => push_assistant_parts(&mut history, &message.parts),
        }
    }

    history
}

fn push_assistant_parts(history: &mut Vec<RunMessage>, parts: &[MessagePart]) {
    let mut pending_text = String::new();

    for part in parts {
        match part {
            MessagePart::Text { text } => pending_text.push_str(text),
            MessagePart::Tool {
                tool_call_id,
                tool_name,
                state,
                input,
                output,
                error_text,
            } => {
                let (content, is_error) = match state {
                    ToolCallState::InputAvailable => continue,
                    ToolCallState::OutputAvailable => {
                        (output.clone().unwrap_or(Value::Null), false)
                    }
                    ToolCallState::OutputError => (
                        Value::String(error_text.clone().unwrap_or_default()),
                        true,
                    ),
                };

                flush_assistant_text(history, &mut pending_text);
                history.push(RunMessage::ToolCall {
                    call_id: tool_call_id.clone(),
                    tool_name: tool_name.clone(),
                    arguments: input.clone().unwrap_or(Value::Null),
                });
                history.push(RunMessage::ToolResult {
                    call_id: tool_call_id.clone(),
                    tool_name: tool_name.clone(),
                    content,
                    is_error,
                });
            }
            MessagePart::Reasoning { .. } | MessagePart::Unknown => {}
        }
    }

    flush_assistant_text(history, &mut pending_text);
}

fn flush_assistant_text(history: &mut Vec<RunMessage>, pending_text: &mut String) {
    if pending_text.is_empty() {
        return;
    }

    history.push(RunMessage::AssistantText {
        text: std::mem::take(pending_text),
    });
}
