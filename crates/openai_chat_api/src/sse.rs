use serde_json::Value;

use crate::events::{ChatStreamEvent, FinishReason};

/// Incremental parser for Chat Completions SSE streams.
#[derive(Debug, Default)]
pub struct SseStreamParser {
    buffer: String,
    /// Trailing bytes of a UTF-8 sequence split across network chunks.
    pending: Vec<u8>,
    done: bool,
}

impl SseStreamParser {
    /// Feed arbitrary bytes into the parser and drain complete events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ChatStreamEvent> {
        self.pending.extend_from_slice(bytes);
        self.decode_pending();
        if self.buffer.contains('\r') {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }
        let mut events = Vec::new();

        while let Some(split) = self.buffer.find("\n\n") {
            let frame = self.buffer[..split].to_string();
            self.buffer.drain(0..split + 2);

            let Some(payload) = extract_data_payload(&frame) else {
                continue;
            };
            if payload == "[DONE]" {
                self.done = true;
                continue;
            }

            match serde_json::from_str::<Value>(&payload) {
                Ok(value) => map_chunk(&value, &mut events),
                Err(error) => {
                    tracing::debug!(%error, "skipping malformed SSE payload");
                }
            }
        }

        events
    }

    /// Parse a complete SSE payload string in one shot.
    pub fn parse_frames(input: &str) -> Vec<ChatStreamEvent> {
        let mut parser = Self::default();
        parser.feed(input.as_bytes())
    }

    /// True once the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.pending.is_empty() && self.buffer.trim().is_empty()
    }

    /// Moves every complete character from `pending` into `buffer`. Invalid
    /// sequences become U+FFFD; an incomplete tail waits for the next chunk.
    fn decode_pending(&mut self) {
        loop {
            let error = match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(error) => error,
            };

            let valid = error.valid_up_to();
            self.buffer
                .push_str(&String::from_utf8_lossy(&self.pending[..valid]));
            let Some(invalid) = error.error_len() else {
                self.pending.drain(..valid);
                return;
            };
            self.buffer.push(char::REPLACEMENT_CHARACTER);
            self.pending.drain(..valid + invalid);
        }
    }
}

fn extract_data_payload(frame: &str) -> Option<String> {
    let data_lines: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect();

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}

fn map_chunk(value: &Value, events: &mut Vec<ChatStreamEvent>) {
    if let Some(error) = value.get("error") {
        let code = error.get("code").and_then(|code| match code {
            Value::String(code) => Some(code.clone()),
            Value::Number(code) => Some(code.to_string()),
            _ => None,
        });
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(ToString::to_string);
        events.push(ChatStreamEvent::Error { code, message });
        return;
    }

    let Some(choice) = value
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
    else {
        return;
    };

    if let Some(delta) = choice.get("delta") {
        let reasoning = delta
            .get("reasoning_content")
            .or_else(|| delta.get("reasoning"))
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty());
        if let Some(text) = reasoning {
            events.push(ChatStreamEvent::ReasoningDelta {
                delta: text.to_owned(),
            });
        }

        if let Some(text) = delta
            .get("content")
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
        {
            events.push(ChatStreamEvent::ContentDelta {
                delta: text.to_owned(),
            });
        }

        if let Some(tool_calls) = delta.get("tool_calls").and_then(Value::as_array) {
            for (position, call) in tool_calls.iter().enumerate() {
                let index = call
                    .get("index")
                    .and_then(Value::as_u64)
                    .and_then(|index| u32::try_from(index).ok())
                    .unwrap_or(position as u32);
                let function = call.get("function");
                events.push(ChatStreamEvent::ToolCallDelta {
                    index,
                    id: string_field(call, "id"),
                    name: function.and_then(|function| string_field(function, "name")),
                    arguments: function.and_then(|function| string_field(function, "arguments")),
                });
            }
        }
    }

    if let Some(reason) = choice.get("finish_reason").and_then(Value::as_str) {
        events.push(ChatStreamEvent::Finished {
            reason: FinishReason::parse(reason),
        });
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}
