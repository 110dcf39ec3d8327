//! Host-side retrieval tool offered to the chat runtime.

use std::sync::Arc;

use chat_runtime::{ToolCallRequest, ToolDefinition, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};
use vector_search::{VectorSearchClient, VectorSearchConfig, VectorSearchError};

pub const SEARCH_TOOL_NAME: &str = "searchVectorDatabase";

pub const SEARCH_TOOL_DESCRIPTION: &str = "Search the vector database for information from uploaded documents. This should be the PRIMARY search tool - always use this FIRST before considering web search.";

const QUERY_DESCRIPTION: &str = "The query to search the vector database for. Optimally is a hypothetical answer for similarity search.";

pub const NOT_CONFIGURED: &str = "vector search is not configured";

#[must_use]
pub fn search_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: SEARCH_TOOL_NAME.to_string(),
        description: Some(SEARCH_TOOL_DESCRIPTION.to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": QUERY_DESCRIPTION,
                }
            },
            "required": ["query"],
            "additionalProperties": false,
        }),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchArguments {
    query: String,
}

/// Similarity search against the document index.
pub trait SearchBackend: Send + Sync {
    /// Returns the service response as-is, or the service error text.
    fn search(&self, query: &str) -> Result<Value, String>;
}

/// Blocking adapter over the async vector-search client.
pub struct PineconeSearchBackend {
    client: VectorSearchClient,
}

impl PineconeSearchBackend {
    pub fn new(config: VectorSearchConfig) -> Result<Self, VectorSearchError> {
        Ok(Self {
            client: VectorSearchClient::new(config)?,
        })
    }
}

impl SearchBackend for PineconeSearchBackend {
    fn search(&self, query: &str) -> Result<Value, String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| format!("failed to initialize search runtime: {error}"))?;

        runtime
            .block_on(self.client.search(query))
            .map_err(|error| error.to_string())
    }
}

/// Backend used when no index credentials were configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredSearch;

impl SearchBackend for UnconfiguredSearch {
    fn search(&self, _query: &str) -> Result<Value, String> {
        Err(NOT_CONFIGURED.to_string())
    }
}

/// Executes runtime tool calls against the configured search backend.
#[derive(Clone)]
pub struct RetrievalToolExecutor {
    backend: Arc<dyn SearchBackend>,
}

impl RetrievalToolExecutor {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        vec![search_tool_definition()]
    }

    /// Never panics: unknown tools, malformed arguments and backend failures all
    /// come back as error results.
    pub fn execute(&self, call: ToolCallRequest) -> ToolResult {
        let ToolCallRequest {
            call_id,
            tool_name,
            arguments,
        } = call;

        if tool_name != SEARCH_TOOL_NAME {
            tracing::warn!(%tool_name, "runtime requested an unknown tool");
            let error = format!("Unknown tool: {tool_name}");
            return ToolResult::error(call_id, tool_name, error);
        }

        let arguments = match serde_json::from_value::<SearchArguments>(arguments) {
            Ok(arguments) => arguments,
            Err(error) => {
                return ToolResult::error(
                    call_id,
                    tool_name,
                    format!("Invalid arguments for {SEARCH_TOOL_NAME}: {error}"),
                );
            }
        };

        tracing::debug!(query = %arguments.query, "searching vector database");
        match self.backend.search(&arguments.query) {
            Ok(response) => ToolResult::success(call_id, tool_name, response),
            Err(error) => {
                tracing::warn!(%error, "vector search failed");
                ToolResult::error(call_id, tool_name, error)
            }
        }
    }
}
