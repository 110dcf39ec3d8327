use thiserror::Error;

pub const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Message cannot be empty.")]
    Empty,
    #[error("Message must be at most {max} characters.")]
    TooLong { max: usize, actual: usize },
}

/// Checks a composed message before it is submitted. Length counts characters,
/// not bytes.
pub fn validate_message(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    let actual = text.chars().count();
    if actual > MAX_MESSAGE_CHARS {
        return Err(ValidationError::TooLong {
            max: MAX_MESSAGE_CHARS,
            actual,
        });
    }

    Ok(())
}
