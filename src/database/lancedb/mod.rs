// LanceDB vector database module
// Handles vector storage and similarity search for chunk embeddings

#[cfg(test)]
mod tests;

pub mod vector_store;

use serde::{Deserialize, Serialize};

pub use vector_store::{SearchResult, VectorStore};

/// Embedding record stored in LanceDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Unique identifier for this record
    pub id: String,
    /// The chunk embedding
    pub vector: Vec<f32>,
    /// Metadata about the chunk this embedding represents
    pub metadata: ChunkMetadata,
}

/// Metadata for a chunk stored alongside its embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Path of the source document
    pub source: String,
    /// Index of this chunk within its document
    pub chunk_index: u32,
    /// The chunk text
    pub content: String,
    /// Timestamp when this record was created
    pub created_at: String,
}
