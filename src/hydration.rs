//! Startup hydration and write-behind persistence of the conversation.

use std::time::{Duration, Instant};

use chat_runtime::UiMessage;
use snapshot_store::{Snapshot, SnapshotStore};
use time::OffsetDateTime;

use crate::session::{ConversationSession, HostOps};

pub const WELCOME_MESSAGE: &str = "Hi! I'm CompliBot. Ask me about factory licences, labour law, environmental clearances, workplace safety, GST basics or MSME registrations, and I'll walk you through what applies to your unit.";

pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 250;
pub const DEFAULT_SAVE_DEBOUNCE: Duration = Duration::from_millis(DEFAULT_SAVE_DEBOUNCE_MS);

/// Builds the assistant greeting shown on an empty conversation.
#[must_use]
pub fn welcome_message(now: OffsetDateTime) -> UiMessage {
    let unix_ms = now.unix_timestamp_nanos() / 1_000_000;
    UiMessage::assistant_text(format!("welcome-{unix_ms}"), WELCOME_MESSAGE)
}

/// Loads the stored snapshot once, hands it to the session on hydration and
/// then keeps storage in step with the session's revision.
pub struct HydrationController {
    store: SnapshotStore,
    loaded: Snapshot,
    hydrated: bool,
    welcome_injected: bool,
    debounce: Duration,
    saved_revision: Option<u64>,
    dirty_since: Option<Instant>,
}

impl HydrationController {
    pub fn new(store: SnapshotStore) -> Self {
        let loaded = store.load();
        tracing::debug!(
            messages = loaded.messages.len(),
            durations = loaded.durations.len(),
            "loaded conversation snapshot"
        );

        Self {
            store,
            loaded,
            hydrated: false,
            welcome_injected: false,
            debounce: DEFAULT_SAVE_DEBOUNCE,
            saved_revision: None,
            dirty_since: None,
        }
    }

    /// Sets how long a change may stay unsaved. Zero writes on every change.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Messages loaded at construction, used to seed the session.
    #[must_use]
    pub fn initial_messages(&self) -> &[UiMessage] {
        &self.loaded.messages
    }

    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    #[must_use]
    pub fn welcome_injected(&self) -> bool {
        self.welcome_injected
    }

    /// Copies the loaded snapshot into `session` and injects the welcome message
    /// when nothing was stored. Only the first call has any effect.
    pub fn hydrate(&mut self, session: &mut ConversationSession) -> bool {
        if self.hydrated {
            return false;
        }
        self.hydrated = true;

        session.set_durations(self.loaded.durations.clone());
        session.set_messages(self.loaded.messages.clone());

        if self.loaded.messages.is_empty() && !self.welcome_injected {
            let welcome = welcome_message(OffsetDateTime::now_utc());
            tracing::debug!(id = %welcome.id, "injecting welcome message");
            session.set_messages(vec![welcome]);
            self.welcome_injected = true;
            self.write(session);
        } else {
            self.saved_revision = Some(session.revision());
        }

        true
    }

    /// Saves once the oldest unsaved change is at least the debounce old.
    /// Returns true when a write happened.
    pub fn persist(&mut self, session: &ConversationSession, now: Instant) -> bool {
        if !self.is_dirty(session) {
            self.dirty_since = None;
            return false;
        }

        let since = *self.dirty_since.get_or_insert(now);
        if now.saturating_duration_since(since) >= self.debounce {
            self.write(session);
            true
        } else {
            false
        }
    }

    /// When the pending change becomes due, if there is one.
    #[must_use]
    pub fn save_deadline(&self) -> Option<Instant> {
        self.dirty_since.map(|since| since + self.debounce)
    }

    /// Writes any unsaved change immediately.
    pub fn flush(&mut self, session: &ConversationSession) -> bool {
        if !self.is_dirty(session) {
            return false;
        }
        self.write(session);
        true
    }

    /// Starts a new conversation with a fresh welcome message and saves it.
    pub fn clear(&mut self, session: &mut ConversationSession, host: &mut dyn HostOps) {
        session.clear_conversation(welcome_message(OffsetDateTime::now_utc()), host);
        self.flush(session);
    }

    fn is_dirty(&self, session: &ConversationSession) -> bool {
        self.hydrated && self.saved_revision != Some(session.revision())
    }

    fn write(&mut self, session: &ConversationSession) {
        self.store.save(session.messages(), session.durations());
        self.saved_revision = Some(session.revision());
        self.dirty_since = None;
    }
}

/// Seeds a session from the controller's loaded messages.
#[must_use]
pub fn seed_session(
    controller: &HydrationController,
    instructions: impl Into<String>,
) -> ConversationSession {
    ConversationSession::new(controller.initial_messages().to_vec(), instructions)
}
