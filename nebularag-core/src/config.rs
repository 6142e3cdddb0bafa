//! Configuration for the NebulaRAG pipeline.
//!
//! Uses `figment` for layered configuration: defaults -> environment.
//! The resulting [`Settings`] value is an explicit snapshot constructed once
//! at process start and passed into the client and pipeline constructors;
//! there is no global configuration state.

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};

/// Immutable configuration snapshot for the client and pipeline.
///
/// Environment sources: `NEBULABLOCK_*` for the inference endpoint and model
/// identifiers, `RAG_*` for the pipeline tunables, and `HTTP_TIMEOUT` for the
/// per-request budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the inference service (trailing slashes are stripped).
    pub base_url: String,
    /// Bearer token for the inference service. Required.
    pub api_key: String,

    /// Endpoint path for the embeddings capability.
    pub embeddings_path: String,
    /// Endpoint path for the rerank capability.
    pub rerank_path: String,
    /// Endpoint path for the chat capability.
    pub chat_path: String,

    /// Model identifier used for embedding requests.
    pub embedding_model: String,
    /// Model identifier used for rerank requests.
    pub reranker_model: String,
    /// Model identifier used for chat requests.
    pub chat_model: String,

    /// Size of each text chunk in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Number of candidates retrieved by similarity search.
    pub top_k: usize,
    /// Number of candidates retained after reranking.
    pub rerank_k: usize,

    /// Per-request timeout in seconds.
    pub timeout: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "https://dev-llm-proxy.nebulablock.com/v1".into(),
            api_key: String::new(),
            embeddings_path: "/embeddings".into(),
            rerank_path: "/rerank".into(),
            chat_path: "/chat/completions".into(),
            embedding_model: "Qwen/Qwen3-Embedding-8B".into(),
            reranker_model: "BAAI/bge-reranker-v2-m3".into(),
            chat_model: "Mistral-Small-24B-Instruct-2501".into(),
            chunk_size: 800,
            chunk_overlap: 120,
            top_k: 12,
            rerank_k: 6,
            timeout: 60.0,
        }
    }
}

impl Settings {
    /// Load settings from the environment on top of the defaults.
    ///
    /// Does not validate; call [`Settings::validate`] once any caller-side
    /// overrides have been applied.
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Env::prefixed("NEBULABLOCK_"))
            .merge(Env::prefixed("RAG_").only(&["chunk_size", "chunk_overlap", "top_k", "rerank_k"]))
            .merge(Env::prefixed("HTTP_").only(&["timeout"]));

        let mut settings: Settings = figment
            .extract()
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })?;
        settings.base_url = settings.base_url.trim_end_matches('/').to_string();
        Ok(settings)
    }

    /// Validate the snapshot, failing fast on the first violated constraint.
    ///
    /// Runs before any network call so configuration mistakes are
    /// distinguishable from runtime service failures.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::EnvVarMissing {
                var: "NEBULABLOCK_API_KEY".into(),
            });
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                message: "chunk_size must be positive".into(),
            });
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::Invalid {
                message: "chunk_overlap must be less than chunk_size".into(),
            });
        }
        if self.top_k == 0 {
            return Err(ConfigError::Invalid {
                message: "top_k must be positive".into(),
            });
        }
        if self.rerank_k == 0 {
            return Err(ConfigError::Invalid {
                message: "rerank_k must be positive".into(),
            });
        }
        if !(self.timeout.is_finite() && self.timeout > 0.0) {
            return Err(ConfigError::Invalid {
                message: "timeout must be positive".into(),
            });
        }
        Ok(())
    }
}
