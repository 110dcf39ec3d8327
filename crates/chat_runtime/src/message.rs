use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Lifecycle of a tool part as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolCallState {
    InputAvailable,
    OutputAvailable,
    OutputError,
}

/// One fragment of a message, in streaming arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePart {
    Text {
        text: String,
    },
    Reasoning {
        text: String,
        #[serde(rename = "elapsedMs", default, skip_serializing_if = "Option::is_none")]
        elapsed_ms: Option<u64>,
    },
    #[serde(rename_all = "camelCase")]
    Tool {
        tool_call_id: String,
        tool_name: String,
        state: ToolCallState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_text: Option<String>,
    },
    /// Part kind written by a newer client; dropped by stores on load.
    #[serde(other)]
    Unknown,
}

impl MessagePart {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

/// UI-facing conversation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiMessage {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl UiMessage {
    #[must_use]
    pub fn user_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::User,
            parts: vec![MessagePart::text(text)],
        }
    }

    #[must_use]
    pub fn assistant_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Assistant,
            parts: vec![MessagePart::text(text)],
        }
    }

    /// Concatenated payload of all `text` parts.
    #[must_use]
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                MessagePart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Composite key of a duration entry: message id plus part index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DurationKey {
    pub message_id: String,
    pub part_index: usize,
}

impl DurationKey {
    #[must_use]
    pub fn new(message_id: impl Into<String>, part_index: usize) -> Self {
        Self {
            message_id: message_id.into(),
            part_index,
        }
    }
}

impl fmt::Display for DurationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.message_id, self.part_index)
    }
}

/// Elapsed milliseconds per message part, stored under `"{message_id}-{part_index}"`.
///
/// Missing entries mean the duration is unknown; they are never reported as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationMap(BTreeMap<String, u64>);

impl DurationMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: &DurationKey, elapsed_ms: u64) {
        self.0.insert(key.to_string(), elapsed_ms);
    }

    #[must_use]
    pub fn get(&self, key: &DurationKey) -> Option<u64> {
        self.0.get(&key.to_string()).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(key, value)| (key.as_str(), *value))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn duration_key_formats_as_message_id_dash_index() {
        assert_eq!(DurationKey::new("m1", 2).to_string(), "m1-2");
        assert_eq!(DurationKey::new("welcome-17", 0).to_string(), "welcome-17-0");
    }

    #[test]
    fn recorded_duration_reads_back_and_unknown_is_none() {
        let mut durations = DurationMap::new();
        durations.record(&DurationKey::new("m1", 2), 1500);

        assert_eq!(durations.get(&DurationKey::new("m1", 2)), Some(1500));
        assert_eq!(durations.get(&DurationKey::new("m1", 3)), None);
        assert_eq!(durations.len(), 1);
    }

    #[test]
    fn parts_serialize_with_type_tags_and_camel_case_fields() {
        let message = UiMessage {
            id: "a1".to_string(),
            role: Role::Assistant,
            parts: vec![
                MessagePart::Reasoning {
                    text: "checking thresholds".to_string(),
                    elapsed_ms: Some(820),
                },
                MessagePart::Tool {
                    tool_call_id: "call-1".to_string(),
                    tool_name: "searchVectorDatabase".to_string(),
                    state: ToolCallState::OutputAvailable,
                    input: Some(json!({"query": "factory licence"})),
                    output: Some(json!({"hits": []})),
                    error_text: None,
                },
                MessagePart::text("Yes."),
            ],
        };

        let value = serde_json::to_value(&message).expect("message should serialize");
        assert_eq!(
            value,
            json!({
                "id": "a1",
                "role": "assistant",
                "parts": [
                    {"type": "reasoning", "text": "checking thresholds", "elapsedMs": 820},
                    {
                        "type": "tool",
                        "toolCallId": "call-1",
                        "toolName": "searchVectorDatabase",
                        "state": "output-available",
                        "input": {"query": "factory licence"},
                        "output": {"hits": []}
                    },
                    {"type": "text", "text": "Yes."}
                ]
            })
        );
    }

    #[test]
    fn unknown_part_types_deserialize_as_unknown() {
        let message: UiMessage = serde_json::from_value(json!({
            "id": "a1",
            "role": "assistant",
            "parts": [
                {"type": "step-start"},
                {"type": "text", "text": "hi"}
            ]
        }))
        .expect("unknown part kinds should not reject the message");

        assert!(message.parts[0].is_unknown());
        assert_eq!(message.text(), "hi");
    }

    #[test]
    fn message_text_joins_only_text_parts() {
        let mut message = UiMessage::assistant_text("a", "Hello ");
        message.parts.push(MessagePart::Reasoning {
            text: "hidden".to_string(),
            elapsed_ms: None,
        });
        message.parts.push(MessagePart::text("world"));

        assert_eq!(message.text(), "Hello world");
    }
}
