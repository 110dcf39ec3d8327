use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorSearchError {
    #[error("vector search API key is required")]
    MissingApiKey,

    #[error("vector search index host is required")]
    MissingIndexHost,

    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} {message}")]
    Status { status: StatusCode, message: String },

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorFields>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorFields {
    message: Option<String>,
}

/// Extracts a human-readable message from an error response body.
///
/// Accepts `{"error":{"message":..}}` and `{"message":..}`; falls back to the raw
/// body, then to the status reason.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        let message = parsed
            .error
            .and_then(|fields| fields.message)
            .or(parsed.message)
            .filter(|message| !message.trim().is_empty());
        if let Some(message) = message {
            return message;
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}
