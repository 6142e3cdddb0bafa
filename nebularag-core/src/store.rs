//! In-memory vector store with cosine-similarity search.

use crate::error::StoreError;

/// Compute cosine similarity between two vectors.
///
/// Returns `0.0` when either vector has a zero norm, avoiding the division
/// by zero.
///
/// # Errors
///
/// Returns [`StoreError::DimensionMismatch`] when the vectors differ in
/// length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> std::result::Result<f32, StoreError> {
    if a.len() != b.len() {
        return Err(StoreError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a * norm_b))
}

/// In-memory store of texts and their embeddings.
///
/// Holds two parallel sequences kept the same length at all observable
/// points. Entries are only ever appended, so an entry's index is stable for
/// the lifetime of the store. Search is a full linear scan — O(n·d) per
/// query — which is deliberate: correctness and simplicity over scale, for
/// corpora of hundreds to low thousands of chunks.
///
/// Not synchronized; a store belongs to one pipeline and callers sharing one
/// across threads must add their own locking.
#[derive(Debug, Default)]
pub struct VectorStore {
    texts: Vec<String>,
    embeddings: Vec<Vec<f32>>,
}

impl VectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append texts and their embeddings, preserving order.
    ///
    /// Empty input is a no-op. Existing entries and their indices are
    /// unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LengthMismatch`] when the two sequences differ
    /// in length; nothing is appended in that case.
    pub fn add(
        &mut self,
        texts: Vec<String>,
        embeddings: Vec<Vec<f32>>,
    ) -> std::result::Result<(), StoreError> {
        if texts.len() != embeddings.len() {
            return Err(StoreError::LengthMismatch {
                texts: texts.len(),
                embeddings: embeddings.len(),
            });
        }
        if texts.is_empty() {
            return Ok(());
        }
        self.texts.extend(texts);
        self.embeddings.extend(embeddings);
        Ok(())
    }

    /// Return up to `k` `(index, score)` pairs ordered by descending cosine
    /// similarity; equal scores order by ascending insertion index.
    ///
    /// Entries whose embedding dimension differs from the query's are
    /// skipped rather than failing the search — a store reused across model
    /// changes may hold mixed dimensions, and the policy here favors
    /// availability over strictness.
    ///
    /// An empty store yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTopK`] when `k` is zero.
    pub fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> std::result::Result<Vec<(usize, f32)>, StoreError> {
        if k == 0 {
            return Err(StoreError::InvalidTopK);
        }
        if self.embeddings.is_empty() {
            return Ok(Vec::new());
        }

        let mut scores: Vec<(usize, f32)> = Vec::with_capacity(self.embeddings.len());
        for (i, emb) in self.embeddings.iter().enumerate() {
            match cosine_similarity(query_embedding, emb) {
                Ok(score) => scores.push((i, score)),
                Err(StoreError::DimensionMismatch { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        scores.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scores.truncate(k);
        Ok(scores)
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.texts.clear();
        self.embeddings.clear();
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// The stored text at `index`, if present.
    pub fn text(&self, index: usize) -> Option<&str> {
        self.texts.get(index).map(String::as_str)
    }
}
