//! Error types for the NebulaRAG core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering chunking, the vector store, the inference client, configuration,
//! and document loading.

use std::path::PathBuf;

/// Top-level error type for the NebulaRAG core library.
#[derive(Debug, thiserror::Error)]
pub enum NebulaRagError {
    #[error("Chunking error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Inference client error: {0}")]
    Client(#[from] ClientError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from invalid chunking parameters.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("chunk_size must be positive, got {size}")]
    InvalidChunkSize { size: usize },

    #[error("chunk_overlap ({overlap}) must be less than chunk_size ({chunk_size})")]
    OverlapTooLarge { overlap: usize, chunk_size: usize },
}

/// Structural invariant violations in the vector store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("texts and embeddings must have the same length: {texts} texts, {embeddings} embeddings")]
    LengthMismatch { texts: usize, embeddings: usize },

    #[error("vectors must have the same length: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("search k must be positive")]
    InvalidTopK,
}

/// Failures at the inference service boundary.
///
/// Every variant carries the endpoint path so callers can tell which of the
/// three capabilities failed. The core performs no retries; these propagate
/// unchanged through the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to construct HTTP client: {message}")]
    Build { message: String },

    #[error("request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },

    #[error("request to {endpoint} timed out after {timeout_secs}s")]
    Timeout { endpoint: String, timeout_secs: u64 },

    #[error("HTTP {status} from {endpoint}: {detail}")]
    Http {
        endpoint: String,
        status: u16,
        detail: String,
    },

    #[error("failed to parse response from {endpoint}: {message}")]
    ResponseParse { endpoint: String, message: String },
}

/// Errors from the configuration snapshot.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable not set: {var}")]
    EnvVarMissing { var: String },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// Errors from the document source.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("No readable text files found in {path}")]
    NoReadableInput { path: PathBuf },
}

/// A type alias for results using the top-level `NebulaRagError`.
pub type Result<T> = std::result::Result<T, NebulaRagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_chunk() {
        let err = NebulaRagError::Chunk(ChunkError::OverlapTooLarge {
            overlap: 120,
            chunk_size: 100,
        });
        assert_eq!(
            err.to_string(),
            "Chunking error: chunk_overlap (120) must be less than chunk_size (100)"
        );
    }

    #[test]
    fn test_error_display_store() {
        let err = NebulaRagError::Store(StoreError::LengthMismatch {
            texts: 3,
            embeddings: 2,
        });
        assert_eq!(
            err.to_string(),
            "Store error: texts and embeddings must have the same length: 3 texts, 2 embeddings"
        );
    }

    #[test]
    fn test_error_display_client() {
        let err = NebulaRagError::Client(ClientError::Http {
            endpoint: "/embeddings".into(),
            status: 503,
            detail: "service unavailable".into(),
        });
        assert_eq!(
            err.to_string(),
            "Inference client error: HTTP 503 from /embeddings: service unavailable"
        );
    }

    #[test]
    fn test_error_display_config() {
        let err = NebulaRagError::Config(ConfigError::EnvVarMissing {
            var: "NEBULABLOCK_API_KEY".into(),
        });
        assert_eq!(
            err.to_string(),
            "Configuration error: Environment variable not set: NEBULABLOCK_API_KEY"
        );
    }

    #[test]
    fn test_error_display_document() {
        let err = NebulaRagError::Document(DocumentError::NoReadableInput {
            path: PathBuf::from("/tmp/docs"),
        });
        assert_eq!(
            err.to_string(),
            "Document error: No readable text files found in /tmp/docs"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: NebulaRagError = io_err.into();
        assert!(matches!(err, NebulaRagError::Io(_)));
    }

    #[test]
    fn test_client_error_variants() {
        let err = ClientError::Timeout {
            endpoint: "/chat/completions".into(),
            timeout_secs: 60,
        };
        assert_eq!(
            err.to_string(),
            "request to /chat/completions timed out after 60s"
        );

        let err = ClientError::ResponseParse {
            endpoint: "/rerank".into(),
            message: "missing field `results`".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to parse response from /rerank: missing field `results`"
        );
    }
}
