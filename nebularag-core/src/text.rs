//! Text chunking.

use crate::error::ChunkError;

/// Split text into overlapping chunks of fixed size.
///
/// A simple character-based splitter: the window is `chunk_size` Unicode
/// scalar values wide and each subsequent window starts `chunk_overlap`
/// characters before the previous window's end. The input is trimmed before
/// splitting and each emitted window is trimmed again; windows that trim to
/// nothing are dropped while the cursor still advances. No awareness of word
/// or sentence boundaries.
///
/// Output is a pure function of the inputs: the same text and parameters
/// always produce the same chunk sequence.
///
/// # Errors
///
/// Returns [`ChunkError::InvalidChunkSize`] when `chunk_size` is zero and
/// [`ChunkError::OverlapTooLarge`] when `chunk_overlap >= chunk_size`.
pub fn split_text(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> std::result::Result<Vec<String>, ChunkError> {
    if chunk_size == 0 {
        return Err(ChunkError::InvalidChunkSize { size: chunk_size });
    }
    if chunk_overlap >= chunk_size {
        return Err(ChunkError::OverlapTooLarge {
            overlap: chunk_overlap,
            chunk_size,
        });
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        let piece = window.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
        if end == chars.len() {
            break;
        }
        // overlap < chunk_size guarantees forward progress
        start = end - chunk_overlap;
    }

    Ok(chunks)
}
