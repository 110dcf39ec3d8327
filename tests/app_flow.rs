use std::time::{Duration, Instant};

use chat_runtime::{Role, RunEvent, RunId, RunMessage};
use complibot::app::App;
use complibot::commands::QUICK_PROMPTS;
use complibot::hydration::HydrationController;
use complibot::session::{ChatStatus, HostOps};
use pretty_assertions::assert_eq;
use snapshot_store::{MemoryStorage, SnapshotStore};

#[derive(Default)]
struct HostSpy {
    next_run_id: RunId,
    started: Vec<Vec<RunMessage>>,
    cancelled: Vec<RunId>,
}

impl HostOps for HostSpy {
    fn start_run(
        &mut self,
        messages: Vec<RunMessage>,
        _instructions: String,
    ) -> Result<RunId, String> {
        self.next_run_id += 1;
        self.started.push(messages);
        Ok(self.next_run_id)
    }

    fn cancel_run(&mut self, run_id: RunId) {
        self.cancelled.push(run_id);
    }
}

fn started_app(storage: &MemoryStorage) -> App {
    let hydration = HydrationController::new(SnapshotStore::new(storage.clone()))
        .with_debounce(Duration::ZERO);
    let mut app = App::new(hydration, "system prompt").with_assistant_name("CompliBot");
    app.start();
    app
}

fn last_user_text(host: &HostSpy) -> Option<String> {
    host.started.last()?.iter().rev().find_map(|message| match message {
        RunMessage::UserText { text } => Some(text.clone()),
        _ => None,
    })
}

#[test]
fn fresh_start_greets_with_quick_prompts() {
    let storage = MemoryStorage::new();
    let mut app = started_app(&storage);

    assert!(app.take_transcript_replaced());
    assert_eq!(app.session().messages().len(), 1);

    let notices = app.take_notices();
    assert_eq!(notices[0], "Hello! My name is CompliBot.");
    assert_eq!(notices[1], "How can I help you today?");
    assert_eq!(notices[2], format!("  /quick 1  {}", QUICK_PROMPTS[0]));
    assert!(notices
        .last()
        .is_some_and(|line| line.starts_with("Ask CompliBot about compliance")));
    assert!(app.take_notices().is_empty());
}

#[test]
fn restored_conversation_skips_the_greeting() {
    let storage = MemoryStorage::new();
    let mut host = HostSpy::default();
    {
        let mut app = started_app(&storage);
        app.on_input("Do I need a factory license?", &mut host);
        app.persist(Instant::now());
    }

    let mut app = started_app(&storage);
    assert_eq!(app.session().messages().len(), 2);
    assert!(app.take_notices().is_empty());
}

#[test]
fn quick_prompt_sends_its_text() {
    let storage = MemoryStorage::new();
    let mut app = started_app(&storage);
    let mut host = HostSpy::default();

    app.on_input("/quick 2", &mut host);

    assert_eq!(last_user_text(&host).as_deref(), Some(QUICK_PROMPTS[1]));
    assert_eq!(app.session().status(), ChatStatus::Submitted);
    let last = app.session().messages().last().expect("user message");
    assert_eq!(last.role, Role::User);
    assert_eq!(last.text(), QUICK_PROMPTS[1]);
}

#[test]
fn quick_without_a_valid_number_lists_prompts() {
    let storage = MemoryStorage::new();
    let mut app = started_app(&storage);
    let mut host = HostSpy::default();
    app.take_notices();

    app.on_input("/quick 9", &mut host);

    assert!(host.started.is_empty());
    assert_eq!(app.take_notices().len(), QUICK_PROMPTS.len());
}

#[test]
fn unknown_command_is_reported_and_not_sent() {
    let storage = MemoryStorage::new();
    let mut app = started_app(&storage);
    let mut host = HostSpy::default();
    app.take_notices();

    app.on_input("/bogus", &mut host);

    assert!(host.started.is_empty());
    assert_eq!(
        app.take_notices(),
        vec!["Unknown command: /bogus. Type /help for commands.".to_string()]
    );
}

#[test]
fn invalid_messages_surface_validation_errors() {
    let storage = MemoryStorage::new();
    let mut app = started_app(&storage);
    let mut host = HostSpy::default();
    app.take_notices();

    app.on_input("   ", &mut host);
    app.on_input(&"a".repeat(2001), &mut host);

    assert!(host.started.is_empty());
    assert_eq!(
        app.take_notices(),
        vec![
            "Message cannot be empty.".to_string(),
            "Message must be at most 2000 characters.".to_string(),
        ]
    );
    assert_eq!(app.session().messages().len(), 1);
}

#[test]
fn second_message_while_busy_is_refused() {
    let storage = MemoryStorage::new();
    let mut app = started_app(&storage);
    let mut host = HostSpy::default();
    app.take_notices();

    app.on_input("first", &mut host);
    app.on_input("second", &mut host);

    assert_eq!(host.started.len(), 1);
    assert_eq!(
        app.take_notices(),
        vec!["A reply is already in progress. Use /stop to cancel it.".to_string()]
    );
}

#[test]
fn streamed_reply_is_applied_and_saved_on_finish() {
    let storage = MemoryStorage::new();
    let mut app = started_app(&storage);
    let mut host = HostSpy::default();

    app.on_input("Do I need a factory license?", &mut host);
    let now = Instant::now();
    app.on_run_event(RunEvent::Started { run_id: 1 }, now);
    app.on_run_event(
        RunEvent::TextDelta {
            run_id: 1,
            text: "Yes.".to_string(),
        },
        now,
    );
    assert_eq!(app.session().status(), ChatStatus::Streaming);
    app.on_run_event(RunEvent::Finished { run_id: 1 }, now);

    assert_eq!(app.session().status(), ChatStatus::Ready);
    let snapshot = SnapshotStore::new(storage.clone()).load();
    assert_eq!(snapshot.messages.len(), 3);
    assert_eq!(snapshot.messages[2].text(), "Yes.");
}

#[test]
fn failed_reply_shows_an_error_notice() {
    let storage = MemoryStorage::new();
    let mut app = started_app(&storage);
    let mut host = HostSpy::default();
    app.take_notices();

    app.on_input("hello", &mut host);
    app.on_run_event(
        RunEvent::Failed {
            run_id: 1,
            error: "HTTP 500".to_string(),
        },
        Instant::now(),
    );

    assert_eq!(app.session().status(), ChatStatus::Error);
    assert_eq!(
        app.take_notices(),
        vec!["Error: HTTP 500. Send your message again to retry.".to_string()]
    );
}

#[test]
fn new_command_clears_and_greets_again() {
    let storage = MemoryStorage::new();
    let mut app = started_app(&storage);
    let mut host = HostSpy::default();
    app.take_transcript_replaced();
    app.on_input("Do I need a factory license?", &mut host);
    app.take_notices();

    app.on_input("/new", &mut host);

    assert_eq!(host.cancelled, vec![1]);
    assert!(app.take_transcript_replaced());
    assert_eq!(app.session().messages().len(), 1);
    assert_eq!(app.session().status(), ChatStatus::Ready);
    let notices = app.take_notices();
    assert_eq!(notices[0], "Chat cleared");
    assert_eq!(notices[1], "Hello! My name is CompliBot.");

    let snapshot = SnapshotStore::new(storage.clone()).load();
    assert_eq!(snapshot.messages.len(), 1);
}

#[test]
fn stop_command_cancels_the_active_reply() {
    let storage = MemoryStorage::new();
    let mut app = started_app(&storage);
    let mut host = HostSpy::default();
    app.take_notices();

    app.on_input("/stop", &mut host);
    assert_eq!(app.take_notices(), vec!["Nothing to stop.".to_string()]);

    app.on_input("hello", &mut host);
    app.on_input("/stop", &mut host);

    assert_eq!(host.cancelled, vec![1]);
    assert_eq!(app.take_notices(), vec!["Stopped.".to_string()]);
    assert_eq!(app.session().status(), ChatStatus::Ready);
    assert!(!app.should_exit());
}

#[test]
fn interrupt_stops_a_reply_then_exits_when_idle() {
    let storage = MemoryStorage::new();
    let mut app = started_app(&storage);
    let mut host = HostSpy::default();
    app.take_notices();

    app.on_input("hello", &mut host);
    app.on_interrupt(&mut host);
    assert!(!app.should_exit());
    assert_eq!(app.take_notices(), vec!["Stopped.".to_string()]);

    app.on_interrupt(&mut host);
    assert!(app.should_exit());
}

#[test]
fn closed_input_waits_for_the_reply_to_end() {
    let storage = MemoryStorage::new();
    let mut app = started_app(&storage);
    let mut host = HostSpy::default();

    app.on_input("hello", &mut host);
    app.on_input_closed();
    assert!(!app.should_exit());

    app.on_run_event(RunEvent::Finished { run_id: 1 }, Instant::now());
    assert!(app.should_exit());
}

#[test]
fn quit_command_exits() {
    let storage = MemoryStorage::new();
    let mut app = started_app(&storage);
    let mut host = HostSpy::default();

    app.on_input("/quit", &mut host);
    assert!(app.should_exit());
}
