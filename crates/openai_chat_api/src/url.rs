/// Default base URL for Chat Completions requests.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const COMPLETIONS_PATH: &str = "/chat/completions";

/// Normalize a base URL to the Chat Completions endpoint.
///
/// A URL that already ends in `/chat/completions` is kept; anything else gets the
/// path appended. Blank input means the default base URL.
pub fn normalize_chat_url(input: &str) -> String {
    let base = match input.trim() {
        "" => DEFAULT_OPENAI_BASE_URL,
        value => value,
    };

    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with(COMPLETIONS_PATH) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{COMPLETIONS_PATH}")
    }
}
