#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::documents::Document;

/// Separators tried in order when looking for a place to end a chunk
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Represents a chunk of a document ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChunk {
    /// The chunk text, an exact substring of the source document
    pub content: String,
    /// Identifier of the source document (its file path)
    pub source: String,
    /// The index of this chunk within its document
    pub chunk_index: usize,
    /// Length of `content` in chars
    pub char_count: usize,
}

/// Configuration for document chunking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in chars
    pub chunk_size: usize,
    /// Chars shared between consecutive chunks of the same document
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 400,
        }
    }
}

/// Chunk a document into embedding-ready pieces
#[inline]
pub fn chunk_document(document: &Document, config: &ChunkingConfig) -> Vec<ContentChunk> {
    let source = document.source_id();
    let chunks: Vec<ContentChunk> = split_text(&document.text, config)
        .into_iter()
        .enumerate()
        .map(|(chunk_index, content)| ContentChunk {
            char_count: content.chars().count(),
            content,
            source: source.clone(),
            chunk_index,
        })
        .collect();

    debug!(
        "Chunked document '{}' into {} chunks (avg {} chars)",
        source,
        chunks.len(),
        chunks.iter().map(|c| c.char_count).sum::<usize>() / chunks.len().max(1)
    );

    chunks
}

/// Split text into overlapping windows of at most `chunk_size` chars.
///
/// Each window ends at the last paragraph break, line break or space that
/// leaves more than `chunk_overlap` chars in the window, falling back to a
/// hard cut. The next window starts `chunk_overlap` chars before that end,
/// so neighbouring windows share exactly `chunk_overlap` chars. Windows that
/// hold only whitespace are dropped.
#[inline]
pub fn split_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    if text.trim().is_empty() || config.chunk_size == 0 {
        return Vec::new();
    }

    // Byte offset of every char, plus the end of the text
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();
    let total_chars = offsets.len() - 1;
    let overlap = config.chunk_overlap.min(config.chunk_size - 1);

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let window_end = (start + config.chunk_size).min(total_chars);
        let end = if window_end == total_chars {
            total_chars
        } else {
            find_break(text, &offsets, start + overlap, start, window_end)
        };

        let chunk = char_slice(text, &offsets, start, end);
        if chunk.trim().is_empty() {
            trace!("Skipping whitespace-only window at char {}", start);
        } else {
            chunks.push(chunk.to_string());
        }

        if end == total_chars {
            break;
        }
        start = end - overlap;
    }

    chunks
}

/// Find the preferred chunk end in `start..=window_end`, strictly after `min_end`
fn find_break(
    text: &str,
    offsets: &[usize],
    min_end: usize,
    start: usize,
    window_end: usize,
) -> usize {
    let window = char_slice(text, offsets, start, window_end);
    let window_offset = offsets[start];

    for separator in SEPARATORS {
        let Some(position) = window.rfind(separator) else {
            continue;
        };
        let break_byte = window_offset + position + separator.len();
        if let Ok(break_char) = offsets.binary_search(&break_byte) {
            if break_char > min_end {
                return break_char;
            }
        }
    }

    window_end
}

#[expect(
    clippy::string_slice,
    reason = "offsets are collected from char_indices and always fall on char boundaries"
)]
fn char_slice<'a>(text: &'a str, offsets: &[usize], start: usize, end: usize) -> &'a str {
    &text[offsets[start]..offsets[end]]
}
