//! Terminal client for an MSME-compliance chat assistant.
//!
//! ## Runtime selection
//!
//! - `COMPLIBOT_RUNTIME=mock` (default) streams a scripted answer, for local runs
//!   and tests.
//! - `COMPLIBOT_RUNTIME=openai` talks to an OpenAI-compatible Chat Completions
//!   endpoint. Requires `OPENAI_API_KEY`; `OPENAI_BASE_URL`, `OPENAI_MODEL` and
//!   `OPENAI_ORG_ID` are optional.
//!
//! ## Retrieval
//!
//! The runtime is offered one tool, `searchVectorDatabase`. It is backed by a
//! managed vector index when `PINECONE_API_KEY` and `PINECONE_INDEX_HOST` are set;
//! otherwise every call returns an error result saying search is not configured.
//!
//! ## Persistence
//!
//! The conversation and the reasoning durations are saved as one JSON document,
//! `chat-messages.json`, under `COMPLIBOT_DATA_DIR` (default: the platform data
//! directory). Saves are coalesced over `COMPLIBOT_SAVE_DEBOUNCE_MS` and flushed
//! when a reply ends, on `/new`, and on exit.
//!
//! All flags are listed by `complibot --help`. Diagnostics go to stderr, filtered
//! by `COMPLIBOT_LOG` (default `warn`).

pub mod app;
pub mod commands;
pub mod config;
pub mod guardrails;
pub mod hydration;
pub mod logging;
pub mod prompt;
pub mod runtime;
pub mod runtimes;
pub mod session;
#[cfg(unix)]
pub mod signals;
pub mod tools;
pub mod validation;
pub mod view;
