//! # NebulaRAG Core
//!
//! Core library for NebulaRAG, a minimal retrieval-augmented generation
//! pipeline over the NebulaBlock inference API. Provides the text chunker,
//! the in-memory cosine-similarity vector store, the inference client, and
//! the retrieve → rerank → answer orchestration.

pub mod client;
pub mod config;
pub mod documents;
pub mod error;
pub mod pipeline;
pub mod store;
pub mod text;

// Re-export commonly used types at the crate root.
pub use client::{
    ChatMessage, InferenceProvider, MockInferenceProvider, NebulaClient, RerankResult,
};
pub use config::Settings;
pub use documents::read_text_files;
pub use error::{
    ChunkError, ClientError, ConfigError, DocumentError, NebulaRagError, Result, StoreError,
};
pub use pipeline::{ModelSelection, PipelineOptions, RagAnswer, RagPipeline};
pub use store::{VectorStore, cosine_similarity};
pub use text::split_text;
