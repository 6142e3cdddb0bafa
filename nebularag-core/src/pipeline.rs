//! Retrieval-augmented generation pipeline.
//!
//! Coordinates chunking, embedding, similarity search, reranking, and
//! answer generation. External calls run in strict sequence — embed, then
//! search, then rerank, then chat — with no internal parallelism or
//! retries; any failure at the inference boundary aborts the operation and
//! propagates to the caller.

use crate::client::{ChatMessage, InferenceProvider};
use crate::config::Settings;
use crate::error::Result;
use crate::store::VectorStore;
use crate::text::split_text;
use serde::Serialize;
use tracing::debug;

/// Separator placed between context snippets in the prompt.
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

const SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the provided context to answer.\n\
                             If the answer is not present in the context, say you don't know.";

/// Chunking and retrieval tunables for a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub rerank_k: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 120,
            top_k: 12,
            rerank_k: 6,
        }
    }
}

impl From<&Settings> for PipelineOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
            top_k: settings.top_k,
            rerank_k: settings.rerank_k,
        }
    }
}

/// The model identifiers in effect when an answer was produced.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ModelSelection {
    pub embedding: String,
    pub reranker: String,
    pub chat: String,
}

/// An end-to-end answer with source attribution.
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    /// Raw text generated by the chat model.
    pub answer: String,
    /// Resolved source texts in final-index order.
    pub sources: Vec<String>,
    /// Store indices of the context snippets, in the order used.
    pub indices: Vec<usize>,
    /// Models configured on the inference client.
    pub models: ModelSelection,
}

/// RAG pipeline over an injected inference provider.
///
/// Owns its [`VectorStore`]; the store is created empty, grows only through
/// [`RagPipeline::index_texts`], and is emptied only by
/// [`RagPipeline::clear`]. A pipeline value belongs to one caller — the
/// mutating operations take `&mut self`, so concurrent add/search cannot
/// happen through a shared reference.
pub struct RagPipeline<C> {
    client: C,
    chunk_size: usize,
    chunk_overlap: usize,
    top_k: usize,
    rerank_k: usize,
    store: VectorStore,
}

impl<C: InferenceProvider> RagPipeline<C> {
    /// Create a pipeline with an empty store.
    pub fn new(client: C, options: PipelineOptions) -> Self {
        Self {
            client,
            chunk_size: options.chunk_size,
            chunk_overlap: options.chunk_overlap,
            top_k: options.top_k,
            rerank_k: options.rerank_k,
            store: VectorStore::new(),
        }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Read access to the injected inference provider.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Drop every indexed entry.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Chunk and index a batch of documents, returning the number of chunks
    /// added.
    ///
    /// Chunks are concatenated across documents in document order, embedded
    /// in a single batch call, and appended atomically: if embedding fails,
    /// the store is left untouched. An input that produces no chunks
    /// returns 0 without calling the embedding capability.
    pub async fn index_texts(&mut self, documents: &[String]) -> Result<usize> {
        let mut chunks: Vec<String> = Vec::new();
        for doc in documents {
            chunks.extend(split_text(doc, self.chunk_size, self.chunk_overlap)?);
        }
        if chunks.is_empty() {
            return Ok(0);
        }

        let embeddings = self.client.embed(&chunks).await?;
        let count = chunks.len();
        self.store.add(chunks, embeddings)?;
        debug!("indexed {} chunks from {} documents", count, documents.len());
        Ok(count)
    }

    /// Embed the question and search the store with the configured `top_k`.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<(usize, f32)>> {
        let batch = [question.to_string()];
        let embeddings = self.client.embed(&batch).await?;
        let query = embeddings.into_iter().next().ok_or_else(|| {
            crate::error::ClientError::ResponseParse {
                endpoint: "embed".into(),
                message: "empty embedding batch for query".into(),
            }
        })?;
        Ok(self.store.search(&query, self.top_k)?)
    }

    /// Rerank candidate store indices against the question.
    ///
    /// Sends the candidates' texts to the rerank capability and maps each
    /// result's local index (its position in the submitted list) back to
    /// the corresponding store index. Results with a missing or
    /// out-of-range local index are dropped. An empty candidate list
    /// returns empty without calling the capability.
    pub async fn rerank(&self, question: &str, candidate_indices: &[usize]) -> Result<Vec<usize>> {
        if candidate_indices.is_empty() {
            return Ok(Vec::new());
        }

        let documents: Vec<String> = candidate_indices
            .iter()
            .map(|&i| self.store.text(i).unwrap_or_default().to_string())
            .collect();
        let results = self
            .client
            .rerank(question, &documents, self.rerank_k)
            .await?;

        let mut out = Vec::new();
        for item in results {
            let Some(local) = item.index else { continue };
            if local < 0 || local as usize >= candidate_indices.len() {
                continue;
            }
            out.push(candidate_indices[local as usize]);
        }
        Ok(out)
    }

    /// Join the texts at `indices` with the context separator.
    ///
    /// An empty index list produces an empty string; a single index
    /// produces exactly that text with no separator.
    pub fn build_context(&self, indices: &[usize]) -> String {
        let snippets: Vec<&str> = indices.iter().filter_map(|&i| self.store.text(i)).collect();
        snippets.join(CONTEXT_SEPARATOR)
    }

    /// Answer a question from the indexed documents.
    ///
    /// Retrieves `top_k` candidates, reranks them, and — when reranking
    /// yields nothing, including the no-candidates case — falls back to the
    /// first `max_context_docs` (default `rerank_k`) candidates in the
    /// original retrieval order. The final context and question are sent to
    /// the chat capability at temperature 0.2.
    pub async fn answer(
        &self,
        question: &str,
        max_context_docs: Option<usize>,
    ) -> Result<RagAnswer> {
        let candidates = self.retrieve(question).await?;
        let candidate_indices: Vec<usize> = candidates.iter().map(|(i, _)| *i).collect();

        let reranked = if candidate_indices.is_empty() {
            Vec::new()
        } else {
            self.rerank(question, &candidate_indices).await?
        };

        let final_indices = if reranked.is_empty() {
            let limit = max_context_docs.unwrap_or(self.rerank_k);
            candidate_indices.into_iter().take(limit).collect()
        } else {
            reranked
        };

        let context = self.build_context(&final_indices);
        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!("Context:\n{context}\n\nQuestion: {question}\n")),
        ];
        let answer = self.client.chat(&messages, 0.2).await?;
        debug!("answered from {} context snippets", final_indices.len());

        let sources = final_indices
            .iter()
            .filter_map(|&i| self.store.text(i).map(str::to_string))
            .collect();
        Ok(RagAnswer {
            answer,
            sources,
            indices: final_indices,
            models: ModelSelection {
                embedding: self.client.embedding_model().to_string(),
                reranker: self.client.reranker_model().to_string(),
                chat: self.client.chat_model().to_string(),
            },
        })
    }
}
