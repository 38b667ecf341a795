// Database module
// LanceDB-backed vector index holding chunk text alongside its embedding

pub mod lancedb;

pub use self::lancedb::{ChunkMetadata, IndexRecord, SearchResult, VectorStore};
