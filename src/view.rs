//! Append-only terminal rendering of the transcript.
//!
//! Streaming only ever appends to the last message, so the printer keeps a
//! cursor into the message list and writes whatever lies past it.

use std::io::{self, Write};

use chat_runtime::{MessagePart, Role, ToolCallState, UiMessage};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartProgress {
    Pending,
    Opened,
    Closed,
}

#[derive(Debug)]
pub struct TranscriptPrinter {
    message: usize,
    part: usize,
    text_offset: usize,
    progress: PartProgress,
    header_printed: bool,
    at_line_start: bool,
}

impl Default for TranscriptPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptPrinter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            message: 0,
            part: 0,
            text_offset: 0,
            progress: PartProgress::Pending,
            header_printed: false,
            at_line_start: true,
        }
    }

    /// Forgets what was printed so the next render starts from the first message.
    pub fn reset(&mut self, out: &mut dyn Write) -> io::Result<()> {
        self.end_line(out)?;
        *self = Self::new();
        Ok(())
    }

    /// Writes everything in `messages` that has not been printed yet.
    pub fn render(
        &mut self,
        messages: &[UiMessage],
        assistant_name: &str,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        if self.message > messages.len() {
            self.reset(out)?;
        }

        while let Some(message) = messages.get(self.message) {
            let is_last_message = self.message + 1 == messages.len();

            if !self.header_printed {
                self.end_line(out)?;
                let label = match message.role {
                    Role::User => "You",
                    Role::Assistant => assistant_name,
                };
                self.write(out, &format!("\n{label}: "))?;
                self.header_printed = true;
            }

            while let Some(part) = message.parts.get(self.part) {
                let followed = self.part + 1 < message.parts.len() || !is_last_message;
                if !self.render_part(part, followed, out)? {
                    out.flush()?;
                    return Ok(());
                }
                self.part += 1;
                self.text_offset = 0;
                self.progress = PartProgress::Pending;
            }

            if is_last_message {
                break;
            }
            self.end_line(out)?;
            self.message += 1;
            self.part = 0;
            self.header_printed = false;
        }

        out.flush()
    }

    /// Prints a transient line below the transcript.
    pub fn notice(&mut self, text: &str, out: &mut dyn Write) -> io::Result<()> {
        self.end_line(out)?;
        self.write(out, &format!("{text}\n"))?;
        out.flush()
    }

    /// Returns true once the part is fully printed.
    fn render_part(
        &mut self,
        part: &MessagePart,
        followed: bool,
        out: &mut dyn Write,
    ) -> io::Result<bool> {
        match part {
            MessagePart::Text { text } => {
                if let Some(fresh) = text.get(self.text_offset..) {
                    if !fresh.is_empty() {
                        self.write(out, fresh)?;
                    }
                }
                self.text_offset = text.len();
                Ok(followed)
            }
            MessagePart::Reasoning { elapsed_ms, .. } => {
                if self.progress == PartProgress::Pending {
                    self.end_line(out)?;
                    self.write(out, "[thinking")?;
                    self.progress = PartProgress::Opened;
                }
                match elapsed_ms {
                    Some(ms) => self.write(out, &format!(" {}]\n", format_seconds(*ms)))?,
                    None if followed => self.write(out, "]\n")?,
                    None => return Ok(false),
                }
                self.progress = PartProgress::Closed;
                Ok(true)
            }
            MessagePart::Tool {
                tool_name,
                state,
                input,
                error_text,
                ..
            } => {
                if self.progress == PartProgress::Pending {
                    self.end_line(out)?;
                    let query = input
                        .as_ref()
                        .and_then(|input| input.get("query"))
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    self.write(out, &format!("[{tool_name}: {query}]\n"))?;
                    self.progress = PartProgress::Opened;
                }
                match state {
                    ToolCallState::InputAvailable if !followed => return Ok(false),
                    ToolCallState::InputAvailable => {}
                    ToolCallState::OutputAvailable => self.write(out, "[search complete]\n")?,
                    ToolCallState::OutputError => self.write(
                        out,
                        &format!(
                            "[search failed: {}]\n",
                            error_text.as_deref().unwrap_or("unknown error")
                        ),
                    )?,
                }
                self.progress = PartProgress::Closed;
                Ok(true)
            }
            MessagePart::Unknown => Ok(true),
        }
    }

    fn end_line(&mut self, out: &mut dyn Write) -> io::Result<()> {
        if !self.at_line_start {
            self.write(out, "\n")?;
        }
        Ok(())
    }

    fn write(&mut self, out: &mut dyn Write, text: &str) -> io::Result<()> {
        out.write_all(text.as_bytes())?;
        if !text.is_empty() {
            self.at_line_start = text.ends_with('\n');
        }
        Ok(())
    }
}

fn format_seconds(ms: u64) -> String {
    format!("{}.{}s", ms / 1000, (ms % 1000) / 100)
}
