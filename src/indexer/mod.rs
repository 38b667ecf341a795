// Indexer module
// Turns the document corpus into a persisted vector index


use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::database::lancedb::{ChunkMetadata, IndexRecord, VectorStore};
use crate::documents::load_documents;
use crate::embeddings::{ChunkingConfig, ContentChunk, Embedder, chunk_document};

const DEFAULT_BATCH_SIZE: usize = 64;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("No documents to index in {}", .0.display())]
    EmptyCorpus(PathBuf),

    #[error("Failed to embed chunks: {0:#}")]
    Embedding(anyhow::Error),

    #[error("Failed to write index: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// What a successful build produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    pub documents: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub index_path: PathBuf,
}

/// Builds the index artifact from a directory of text documents
pub struct Indexer<E: Embedder> {
    chunking: ChunkingConfig,
    embedder: E,
    batch_size: usize,
}

impl<E: Embedder> Indexer<E> {
    #[inline]
    pub fn new(chunking: ChunkingConfig, embedder: E) -> Self {
        Self {
            chunking,
            embedder,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Number of chunks handed to the embedder per call
    #[inline]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Load, chunk and embed every document in `docs_dir`, then replace the
    /// index at `index_path` with the result.
    ///
    /// Nothing is written unless every chunk was embedded. An existing index
    /// survives any failure.
    #[inline]
    pub async fn build_index(
        &self,
        docs_dir: &Path,
        index_path: &Path,
    ) -> Result<IndexSummary, IndexError> {
        info!("Building index from {:?} into {:?}", docs_dir, index_path);

        let documents = match load_documents(docs_dir) {
            Ok(documents) => documents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Documents directory {:?} does not exist", docs_dir);
                return Err(IndexError::EmptyCorpus(docs_dir.to_path_buf()));
            }
            Err(e) => return Err(IndexError::Io(e)),
        };

        println!(
            "{} {} documents from {}",
            style("Loaded").green(),
            documents.len(),
            style(docs_dir.display()).cyan()
        );

        let chunks: Vec<ContentChunk> = documents
            .iter()
            .flat_map(|document| chunk_document(document, &self.chunking))
            .collect();

        if chunks.is_empty() {
            warn!("No chunks produced from {:?}", docs_dir);
            return Err(IndexError::EmptyCorpus(docs_dir.to_path_buf()));
        }

        println!(
            "{} {} chunks (size {}, overlap {})",
            style("Split into").green(),
            chunks.len(),
            self.chunking.chunk_size,
            self.chunking.chunk_overlap
        );

        let vectors = self.embed_chunks(&chunks)?;
        let dimension = vectors.first().map_or(0, Vec::len);

        let created_at = Utc::now().to_rfc3339();
        let records: Vec<IndexRecord> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexRecord {
                id: Uuid::new_v4().to_string(),
                vector,
                metadata: ChunkMetadata {
                    source: chunk.source,
                    chunk_index: u32::try_from(chunk.chunk_index).unwrap_or(u32::MAX),
                    content: chunk.content,
                    created_at: created_at.clone(),
                },
            })
            .collect();

        let chunk_count = records.len();
        write_index(index_path, dimension, &records).await?;

        println!(
            "{} {} chunks to {}",
            style("Indexed").green().bold(),
            chunk_count,
            style(index_path.display()).cyan()
        );
        info!(
            "Index built: {} documents, {} chunks, {} dimensions",
            documents.len(),
            chunk_count,
            dimension
        );

        Ok(IndexSummary {
            documents: documents.len(),
            chunks: chunk_count,
            dimension,
            index_path: index_path.to_path_buf(),
        })
    }

    /// Embed every chunk, failing as a whole if any batch fails or the
    /// vectors disagree on dimension
    fn embed_chunks(&self, chunks: &[ContentChunk]) -> Result<Vec<Vec<f32>>, IndexError> {
        let bar = if console::user_attended() {
            ProgressBar::new(chunks.len() as u64).with_style(
                ProgressStyle::with_template("{bar:40} [{pos}/{len}] Embedding chunks")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            )
        } else {
            ProgressBar::hidden()
        };

        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.content.clone()).collect();

            let embeddings = self.embedder.embed_batch(&texts).map_err(|e| {
                error!("Embedding failed: {:#}", e);
                bar.abandon();
                IndexError::Embedding(e)
            })?;

            if embeddings.len() != texts.len() {
                bar.abandon();
                return Err(IndexError::Embedding(anyhow::anyhow!(
                    "Expected {} embeddings, received {}",
                    texts.len(),
                    embeddings.len()
                )));
            }

            vectors.extend(embeddings);
            bar.inc(batch.len() as u64);
        }
        bar.finish_and_clear();

        let dimension = vectors.first().map_or(0, Vec::len);
        if dimension == 0 {
            return Err(IndexError::Embedding(anyhow::anyhow!(
                "Embedder returned empty vectors"
            )));
        }
        if let Some(position) = vectors.iter().position(|v| v.len() != dimension) {
            return Err(IndexError::Embedding(anyhow::anyhow!(
                "Embedding {} has {} dimensions, expected {}",
                position,
                vectors[position].len(),
                dimension
            )));
        }

        debug!("Embedded {} chunks ({} dimensions)", vectors.len(), dimension);
        Ok(vectors)
    }
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn remove_dir_if_present(path: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Write `records` into a staging database and swap it onto `index_path`
async fn write_index(
    index_path: &Path,
    dimension: usize,
    records: &[IndexRecord],
) -> Result<(), IndexError> {
    let staging = sibling_path(index_path, ".staging");
    remove_dir_if_present(&staging)?;

    let written = async {
        let mut store = VectorStore::create(&staging, dimension).await?;
        store.store_records(records).await
    }
    .await;

    if let Err(e) = written {
        error!("Failed to write staging index {:?}: {}", staging, e);
        if let Err(cleanup) = remove_dir_if_present(&staging) {
            warn!("Failed to remove staging index {:?}: {}", staging, cleanup);
        }
        return Err(IndexError::Storage(e.to_string()));
    }

    swap_into_place(&staging, index_path).map_err(|e| {
        error!("Failed to move new index into place: {}", e);
        if let Err(cleanup) = remove_dir_if_present(&staging) {
            warn!("Failed to remove staging index {:?}: {}", staging, cleanup);
        }
        IndexError::Storage(format!("Failed to replace {}: {}", index_path.display(), e))
    })
}

fn swap_into_place(staging: &Path, target: &Path) -> io::Result<()> {
    if !target.exists() {
        return std::fs::rename(staging, target);
    }

    let previous = sibling_path(target, ".old");
    remove_dir_if_present(&previous)?;
    std::fs::rename(target, &previous)?;

    if let Err(e) = std::fs::rename(staging, target) {
        // Put the previous index back before reporting
        std::fs::rename(&previous, target)?;
        return Err(e);
    }

    if let Err(e) = remove_dir_if_present(&previous) {
        warn!("Failed to remove previous index {:?}: {}", previous, e);
    }
    Ok(())
}
