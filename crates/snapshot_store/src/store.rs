use chat_runtime::{DurationMap, UiMessage};

use crate::backend::StorageBackend;
use crate::error::SnapshotStoreError;
use crate::schema::{Snapshot, SnapshotRef};

/// Fixed storage key of the conversation snapshot.
pub const STORAGE_KEY: &str = "chat-messages";

pub struct SnapshotStore {
    backend: Box<dyn StorageBackend>,
    key: String,
}

impl SnapshotStore {
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            key: STORAGE_KEY.to_string(),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the stored snapshot, or an empty one when nothing usable is stored.
    pub fn load(&self) -> Snapshot {
        match self.try_load() {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "failed to load conversation snapshot");
                Snapshot::default()
            }
        }
    }

    /// Overwrites the stored snapshot. Failures are logged and otherwise ignored.
    pub fn save(&mut self, messages: &[UiMessage], durations: &DurationMap) {
        if let Err(error) = self.try_save(messages, durations) {
            tracing::warn!(key = %self.key, %error, "failed to save conversation snapshot");
        }
    }

    pub fn try_load(&self) -> Result<Snapshot, SnapshotStoreError> {
        let Some(stored) = self.backend.get_item(&self.key)? else {
            return Ok(Snapshot::default());
        };

        let snapshot = serde_json::from_str::<Snapshot>(&stored)
            .map_err(|source| SnapshotStoreError::parse(&self.key, source))?;

        Ok(snapshot.without_unknown_parts())
    }

    pub fn try_save(
        &mut self,
        messages: &[UiMessage],
        durations: &DurationMap,
    ) -> Result<(), SnapshotStoreError> {
        let document = serde_json::to_string(&SnapshotRef {
            messages,
            durations,
        })
        .map_err(|source| SnapshotStoreError::serialize(&self.key, source))?;

        self.backend.set_item(&self.key, &document)?;
        tracing::trace!(
            key = %self.key,
            messages = messages.len(),
            bytes = document.len(),
            "saved conversation snapshot"
        );
        Ok(())
    }
}
