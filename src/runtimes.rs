use std::sync::Arc;

use chat_runtime::{ChatRuntime, RuntimeInitError};
use chat_runtime_mock::MockRuntime;
use chat_runtime_openai::{OpenAiChatRuntime, OpenAiRuntimeConfig};
use vector_search::VectorSearchError;

use crate::config::{Cli, RuntimeKind};
use crate::tools::{PineconeSearchBackend, SearchBackend, UnconfiguredSearch, SEARCH_TOOL_NAME};

pub fn runtime_from_config(cli: &Cli) -> Result<Arc<dyn ChatRuntime>, RuntimeInitError> {
    match cli.runtime {
        RuntimeKind::Mock => Ok(Arc::new(
            MockRuntime::default().with_search_tool(SEARCH_TOOL_NAME),
        )),
        RuntimeKind::Openai => {
            let api_key = cli.openai_api_key().ok_or_else(|| {
                RuntimeInitError::new("OPENAI_API_KEY is required for the openai runtime")
            })?;
            let mut config = OpenAiRuntimeConfig::new(api_key, cli.openai_model.as_str());
            if let Some(base_url) = cli.openai_base_url() {
                config = config.with_base_url(base_url);
            }
            if let Some(organization) = cli.openai_organization() {
                config = config.with_organization(organization);
            }
            Ok(Arc::new(OpenAiChatRuntime::new(config)?))
        }
    }
}

/// Search backend for the retrieval tool. Missing credentials are not an error:
/// the tool then reports that search is not configured.
pub fn search_backend_from_config(
    cli: &Cli,
) -> Result<Arc<dyn SearchBackend>, VectorSearchError> {
    match cli.vector_search_config() {
        Some(config) => Ok(Arc::new(PineconeSearchBackend::new(config)?)),
        None => {
            tracing::info!("vector search credentials not set; retrieval tool disabled");
            Ok(Arc::new(UnconfiguredSearch))
        }
    }
}
