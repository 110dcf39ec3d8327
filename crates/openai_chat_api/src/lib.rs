//! Transport-only client for OpenAI-compatible Chat Completions streaming.
//!
//! This crate builds requests, performs the HTTP call and normalizes the SSE
//! chunk stream into [`ChatStreamEvent`]s. It knows nothing about conversations,
//! tools or UI state; tool-call deltas are surfaced raw for the caller to
//! accumulate.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod payload;
pub mod sse;
pub mod url;

pub use client::{CancellationSignal, OpenAiChatClient, StreamResult};
pub use config::OpenAiChatConfig;
pub use error::{parse_error_message, OpenAiChatError};
pub use events::{ChatStreamEvent, FinishReason};
pub use payload::{ChatCompletionRequest, ChatFunctionCall, ChatMessage, ChatTool, ChatToolCall};
pub use sse::SseStreamParser;
pub use url::normalize_chat_url;
