use chat_runtime::{DurationMap, UiMessage};
use serde::{Deserialize, Serialize};

/// The persisted (messages, durations) pair.
///
/// There is no version field: absent fields deserialize as empty so older or newer
/// documents still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub messages: Vec<UiMessage>,
    #[serde(default)]
    pub durations: DurationMap,
}

impl Snapshot {
    #[must_use]
    pub fn new(messages: Vec<UiMessage>, durations: DurationMap) -> Self {
        Self {
            messages,
            durations,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.durations.is_empty()
    }

    /// Drops parts whose kind this client does not know.
    pub(crate) fn without_unknown_parts(mut self) -> Self {
        for message in &mut self.messages {
            message.parts.retain(|part| !part.is_unknown());
        }
        self
    }
}

/// Borrowed view used for serialization so `save` never clones the history.
#[derive(Serialize)]
pub(crate) struct SnapshotRef<'a> {
    pub messages: &'a [UiMessage],
    pub durations: &'a DurationMap,
}
