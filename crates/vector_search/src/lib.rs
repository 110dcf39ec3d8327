//! Client for a managed vector index with integrated embeddings.
//!
//! The index embeds the query text server-side, so callers send plain text and get
//! the raw search response back. No retry, timeout, or result filtering happens
//! here; those policies belong to the service.

pub mod client;
pub mod config;
pub mod error;
pub mod url;

pub use client::{VectorSearchClient, HEADER_API_KEY, HEADER_API_VERSION};
pub use config::VectorSearchConfig;
pub use error::{parse_error_message, VectorSearchError};
pub use url::{normalize_index_host, search_url};
