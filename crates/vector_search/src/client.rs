use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::VectorSearchConfig;
use crate::error::{parse_error_message, VectorSearchError};
use crate::url::search_url;

pub const HEADER_API_KEY: &str = "api-key";
pub const HEADER_API_VERSION: &str = "x-pinecone-api-version";

#[derive(Debug)]
pub struct VectorSearchClient {
    http: Client,
    config: VectorSearchConfig,
}

#[derive(Debug, Serialize)]
struct SearchBody<'a> {
    query: SearchQuery<'a>,
}

#[derive(Debug, Serialize)]
struct SearchQuery<'a> {
    inputs: SearchInputs<'a>,
    top_k: u32,
}

#[derive(Debug, Serialize)]
struct SearchInputs<'a> {
    text: &'a str,
}

impl VectorSearchClient {
    pub fn new(config: VectorSearchConfig) -> Result<Self, VectorSearchError> {
        if config.api_key.trim().is_empty() {
            return Err(VectorSearchError::MissingApiKey);
        }
        if config.index_host.trim().is_empty() {
            return Err(VectorSearchError::MissingIndexHost);
        }

        let http = Client::builder().build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &VectorSearchConfig {
        &self.config
    }

    pub fn search_url(&self) -> String {
        search_url(&self.config.index_host, &self.config.namespace)
    }

    pub fn build_headers(&self) -> Result<HeaderMap, VectorSearchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HEADER_API_KEY,
            HeaderValue::from_str(self.config.api_key.trim())
                .map_err(|_| VectorSearchError::InvalidHeader(HEADER_API_KEY))?,
        );
        headers.insert(
            HEADER_API_VERSION,
            HeaderValue::from_str(self.config.api_version.trim())
                .map_err(|_| VectorSearchError::InvalidHeader(HEADER_API_VERSION))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Builds the search request; `query` is sent as-is.
    pub fn build_request(&self, query: &str) -> Result<reqwest::RequestBuilder, VectorSearchError> {
        let body = SearchBody {
            query: SearchQuery {
                inputs: SearchInputs { text: query },
                top_k: self.config.top_k,
            },
        };

        Ok(self
            .http
            .post(self.search_url())
            .headers(self.build_headers()?)
            .json(&body))
    }

    /// Runs one search and returns the service's JSON response unmodified.
    pub async fn search(&self, query: &str) -> Result<Value, VectorSearchError> {
        tracing::debug!(
            namespace = %self.config.namespace,
            top_k = self.config.top_k,
            query_chars = query.chars().count(),
            "vector search request"
        );

        let response = self.build_request(query)?.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = parse_error_message(status, &body);
            tracing::warn!(%status, %message, "vector search failed");
            return Err(VectorSearchError::Status { status, message });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
