//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use chat_runtime_openai::DEFAULT_MODEL;
use clap::{Parser, ValueEnum};
use vector_search::config::{DEFAULT_NAMESPACE, DEFAULT_TOP_K};
use vector_search::VectorSearchConfig;

use crate::hydration::DEFAULT_SAVE_DEBOUNCE_MS;
use crate::prompt::PromptOptions;

pub const DEFAULT_AI_NAME: &str = "CompliBot";
const DATA_DIR_NAME: &str = "complibot";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RuntimeKind {
    Mock,
    Openai,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "complibot")]
#[command(about = "Chat with an MSME-compliance assistant from the terminal")]
#[command(version)]
pub struct Cli {
    /// Chat runtime answering the questions
    #[arg(long, env = "COMPLIBOT_RUNTIME", value_enum, default_value_t = RuntimeKind::Mock)]
    pub runtime: RuntimeKind,

    /// Directory holding the saved conversation
    #[arg(long, env = "COMPLIBOT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Assistant name used in the system prompt
    #[arg(long, env = "COMPLIBOT_AI_NAME", default_value = DEFAULT_AI_NAME)]
    pub ai_name: String,

    /// Owner name used in the system prompt
    #[arg(long, env = "COMPLIBOT_OWNER_NAME")]
    pub owner_name: Option<String>,

    /// Jurisdiction assumed unless the user says otherwise
    #[arg(long, env = "COMPLIBOT_JURISDICTION")]
    pub jurisdiction: Option<String>,

    /// Persona preset: FRIENDLY, FORMAL or NO_NONSENSE
    #[arg(long, env = "COMPLIBOT_PERSONA")]
    pub persona: Option<String>,

    /// Milliseconds a change may wait before it is saved (0 saves every change)
    #[arg(long, env = "COMPLIBOT_SAVE_DEBOUNCE_MS", default_value_t = DEFAULT_SAVE_DEBOUNCE_MS)]
    pub save_debounce_ms: u64,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL")]
    pub openai_base_url: Option<String>,

    #[arg(long, env = "OPENAI_ORG_ID")]
    pub openai_organization: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub openai_model: String,

    #[arg(long, env = "PINECONE_API_KEY", hide_env_values = true)]
    pub pinecone_api_key: Option<String>,

    /// Index host, with or without scheme
    #[arg(long, env = "PINECONE_INDEX_HOST")]
    pub pinecone_index_host: Option<String>,

    #[arg(long, env = "PINECONE_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub pinecone_namespace: String,

    /// Number of matches returned per search
    #[arg(long, env = "PINECONE_TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub pinecone_top_k: u32,
}

impl Cli {
    /// Storage directory: the flag, else the platform data dir, else `./.complibot`.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join(DATA_DIR_NAME))
                .unwrap_or_else(|| PathBuf::from(format!(".{DATA_DIR_NAME}")))
        })
    }

    #[must_use]
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    #[must_use]
    pub fn prompt_options(&self) -> PromptOptions {
        PromptOptions {
            ai_name: Some(self.ai_name.clone()),
            owner_name: non_blank(self.owner_name.as_deref()),
            jurisdiction: non_blank(self.jurisdiction.as_deref()),
            persona: non_blank(self.persona.as_deref()),
        }
    }

    #[must_use]
    pub fn openai_api_key(&self) -> Option<String> {
        non_blank(self.openai_api_key.as_deref())
    }

    /// Base URL override; blank means the default endpoint.
    #[must_use]
    pub fn openai_base_url(&self) -> Option<String> {
        non_blank(self.openai_base_url.as_deref())
    }

    #[must_use]
    pub fn openai_organization(&self) -> Option<String> {
        non_blank(self.openai_organization.as_deref())
    }

    /// Search settings, or `None` unless both the key and the index host are set.
    #[must_use]
    pub fn vector_search_config(&self) -> Option<VectorSearchConfig> {
        let api_key = non_blank(self.pinecone_api_key.as_deref())?;
        let index_host = non_blank(self.pinecone_index_host.as_deref())?;

        Some(
            VectorSearchConfig::new(api_key, index_host)
                .with_namespace(self.pinecone_namespace.clone())
                .with_top_k(self.pinecone_top_k),
        )
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
