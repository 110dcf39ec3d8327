/// Starter questions offered while the conversation is empty.
pub const QUICK_PROMPTS: [&str; 3] = [
    "Do I need a factory license?",
    "What are my labour rights?",
    "Tell me about waste management.",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    New,
    Stop,
    /// 1-based quick prompt number; `None` when missing or not a number.
    Quick(Option<usize>),
    Quit,
    Unknown(String),
}

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut words = trimmed.split_whitespace();
    let command = words.next().unwrap_or(trimmed).to_string();

    let parsed = match command.as_str() {
        "/help" => SlashCommand::Help,
        "/new" | "/clear" => SlashCommand::New,
        "/stop" => SlashCommand::Stop,
        "/quick" => SlashCommand::Quick(words.next().and_then(|arg| arg.parse().ok())),
        "/quit" | "/exit" => SlashCommand::Quit,
        _ => SlashCommand::Unknown(command),
    };

    Some(parsed)
}

/// Looks up a 1-based quick prompt number.
#[must_use]
pub fn quick_prompt(number: usize) -> Option<&'static str> {
    number
        .checked_sub(1)
        .and_then(|index| QUICK_PROMPTS.get(index))
        .copied()
}
