use std::time::Instant;

use chat_runtime::RunEvent;

use crate::commands::{parse_slash_command, quick_prompt, SlashCommand, QUICK_PROMPTS};
use crate::config::DEFAULT_AI_NAME;
use crate::guardrails::flagged_keyword;
use crate::hydration::{seed_session, HydrationController};
use crate::session::{ChatStatus, ConversationSession, HostOps, SendError};

const HELP_TEXT: &str =
    "Commands: /help, /new (alias /clear), /stop, /quick <n>, /quit. Anything else is sent as a message.";
const CLEARED_NOTICE: &str = "Chat cleared";

/// Terminal-facing shell around the session: input handling, commands and
/// transient notices. Notices are never persisted.
pub struct App {
    session: ConversationSession,
    hydration: HydrationController,
    assistant_name: String,
    notices: Vec<String>,
    transcript_replaced: bool,
    exit_when_idle: bool,
    should_exit: bool,
}

impl App {
    pub fn new(hydration: HydrationController, instructions: impl Into<String>) -> Self {
        let session = seed_session(&hydration, instructions);
        Self {
            session,
            hydration,
            assistant_name: DEFAULT_AI_NAME.to_string(),
            notices: Vec::new(),
            transcript_replaced: false,
            exit_when_idle: false,
            should_exit: false,
        }
    }

    #[must_use]
    pub fn with_assistant_name(mut self, assistant_name: impl Into<String>) -> Self {
        self.assistant_name = assistant_name.into();
        self
    }

    /// Hydrates the session and greets the user when there is no conversation yet.
    pub fn start(&mut self) {
        if self.hydration.hydrate(&mut self.session) {
            self.transcript_replaced = true;
        }

        if !self.session.has_conversation() {
            self.push_greeting();
        }
    }

    #[must_use]
    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    #[must_use]
    pub fn assistant_name(&self) -> &str {
        &self.assistant_name
    }

    #[must_use]
    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// True once after the message list was replaced wholesale (hydration, clear).
    pub fn take_transcript_replaced(&mut self) -> bool {
        std::mem::take(&mut self.transcript_replaced)
    }

    pub fn on_input(&mut self, line: &str, host: &mut dyn HostOps) {
        match parse_slash_command(line) {
            Some(command) => self.on_command(command, host),
            None => self.submit(line.trim_end_matches(&['\r', '\n'][..]), host),
        }
    }

    pub fn on_run_event(&mut self, event: RunEvent, now: Instant) {
        let terminal = event.is_terminal();
        if !self.session.apply_run_event(event, now) || !terminal {
            return;
        }

        if self.session.status() == ChatStatus::Error {
            let error = self.session.last_error().unwrap_or("unknown error");
            self.notices
                .push(format!("Error: {error}. Send your message again to retry."));
        }
        self.hydration.flush(&self.session);

        if self.exit_when_idle {
            self.should_exit = true;
        }
    }

    /// Stops the in-flight reply, or asks to exit when there is none.
    pub fn on_interrupt(&mut self, host: &mut dyn HostOps) {
        if self.session.stop(host) {
            self.notices.push("Stopped.".to_string());
            self.hydration.flush(&self.session);
        } else {
            self.should_exit = true;
        }
    }

    /// End of input: exit now, or once the in-flight reply completes.
    pub fn on_input_closed(&mut self) {
        if self.session.status().is_busy() {
            self.exit_when_idle = true;
        } else {
            self.should_exit = true;
        }
    }

    /// Gives the debounced writer a chance to save. Returns true on a write.
    pub fn persist(&mut self, now: Instant) -> bool {
        self.hydration.persist(&self.session, now)
    }

    #[must_use]
    pub fn save_deadline(&self) -> Option<Instant> {
        self.hydration.save_deadline()
    }

    pub fn shutdown(&mut self, host: &mut dyn HostOps) {
        self.session.stop(host);
        self.hydration.flush(&self.session);
    }

    fn on_command(&mut self, command: SlashCommand, host: &mut dyn HostOps) {
        match command {
            SlashCommand::Help => self.notices.push(HELP_TEXT.to_string()),
            SlashCommand::New => {
                self.hydration.clear(&mut self.session, host);
                self.transcript_replaced = true;
                self.notices.push(CLEARED_NOTICE.to_string());
                self.push_greeting();
            }
            SlashCommand::Stop => {
                if self.session.stop(host) {
                    self.notices.push("Stopped.".to_string());
                    self.hydration.flush(&self.session);
                } else {
                    self.notices.push("Nothing to stop.".to_string());
                }
            }
            SlashCommand::Quick(number) => match number.and_then(quick_prompt) {
                Some(prompt) => self.submit(prompt, host),
                None => self.push_quick_prompts(),
            },
            SlashCommand::Quit => self.should_exit = true,
            SlashCommand::Unknown(command) => self.notices.push(format!(
                "Unknown command: {command}. Type /help for commands."
            )),
        }
    }

    fn submit(&mut self, text: &str, host: &mut dyn HostOps) {
        if let Some(keyword) = flagged_keyword(text) {
            tracing::info!(keyword, "message matches the illegal-intent heuristic");
        }

        match self.session.send(text, host) {
            Ok(_) => {}
            Err(SendError::Busy) => self
                .notices
                .push("A reply is already in progress. Use /stop to cancel it.".to_string()),
            Err(error) => self.notices.push(error.to_string()),
        }
    }

    fn push_greeting(&mut self) {
        self.notices
            .push(format!("Hello! My name is {}.", self.assistant_name));
        self.notices.push("How can I help you today?".to_string());
        self.push_quick_prompts();
        self.notices.push(format!(
            "Ask {} about compliance, registrations, fines... (/help for commands)",
            self.assistant_name
        ));
    }

    fn push_quick_prompts(&mut self) {
        for (index, prompt) in QUICK_PROMPTS.iter().enumerate() {
            self.notices.push(format!("  /quick {}  {prompt}", index + 1));
        }
    }
}
