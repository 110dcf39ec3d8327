use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenAiChatError {
    #[error("API key is required")]
    MissingApiKey,

    #[error("model is required")]
    MissingModel,

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} {message}")]
    Status { status: StatusCode, message: String },

    #[error("{}", stream_failed_message(.code.as_deref(), .message))]
    StreamFailed {
        code: Option<String>,
        message: String,
    },

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("request was cancelled")]
    Cancelled,

    #[error("{0}")]
    Unknown(String),
}

fn stream_failed_message(code: Option<&str>, message: &str) -> String {
    match code {
        Some(code) if !code.trim().is_empty() => format!("stream failed ({code}): {message}"),
        _ => format!("stream failed: {message}"),
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<ErrorPayloadFields>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayloadFields {
    message: Option<String>,
    code: Option<serde_json::Value>,
    #[serde(rename = "type")]
    type_: Option<String>,
}

/// Extracts the provider's error message from a non-success response body.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    let fields = serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(|payload| payload.error);

    if let Some(fields) = fields {
        if let Some(message) = fields.message.filter(|value| !value.trim().is_empty()) {
            return message;
        }
        let code = fields
            .code
            .as_ref()
            .and_then(|code| code.as_str().map(ToOwned::to_owned))
            .or(fields.type_);
        if let Some(code) = code.filter(|value| !value.trim().is_empty()) {
            return code;
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
