// Embeddings module
// Document chunking and the embedding service client

pub mod chunking;
pub mod openai;

use anyhow::Result;

pub use chunking::{ChunkingConfig, ContentChunk, chunk_document, split_text};
pub use openai::OpenAiClient;

/// Turns text into fixed-dimension vectors for similarity search
pub trait Embedder {
    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, returning one vector per input in the same order
    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

impl<T: Embedder + ?Sized> Embedder for &T {
    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text)
    }

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts)
    }
}
