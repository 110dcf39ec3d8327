pub const DEFAULT_NAMESPACE: &str = "__default__";
pub const DEFAULT_TOP_K: u32 = 3;
pub const DEFAULT_API_VERSION: &str = "2025-04";

/// Connection settings for one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorSearchConfig {
    /// Value of the `Api-Key` header.
    pub api_key: String,
    /// Data-plane host of the index, with or without scheme.
    pub index_host: String,
    pub namespace: String,
    /// Number of hits requested per query.
    pub top_k: u32,
    /// Value of the `X-Pinecone-API-Version` header.
    pub api_version: String,
}

impl Default for VectorSearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            index_host: String::new(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            top_k: DEFAULT_TOP_K,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl VectorSearchConfig {
    pub fn new(api_key: impl Into<String>, index_host: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            index_host: index_host.into(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }
}
