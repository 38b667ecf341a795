// Query engine
// Retrieves the passages nearest to a question and asks the generator to answer from them


use std::path::Path;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::database::lancedb::{SearchResult, VectorStore};
use crate::embeddings::Embedder;
use crate::generation::{Generator, build_prompt};

/// Why a question could not be answered.
///
/// Every message starts with "Error" so the chat can show it as-is.
#[derive(Error, Debug)]
pub enum AnswerError {
    #[error("Error: knowledge base not loaded. Please ensure the index has been built or check the docs folder.")]
    IndexUnavailable,

    #[error("Error while embedding the question: {0:#}")]
    Embedding(anyhow::Error),

    #[error("Error while searching the index: {0}")]
    Retrieval(String),

    #[error("Error while generating the answer: {0:#}")]
    Generation(anyhow::Error),
}

/// A generated answer and where its context came from
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}

pub struct QueryEngine<E: Embedder, G: Generator> {
    store: Option<VectorStore>,
    load_error: Option<String>,
    embedder: E,
    generator: G,
    top_k: usize,
}

impl<E: Embedder, G: Generator> QueryEngine<E, G> {
    /// Open the index at `index_path`.
    ///
    /// A missing or unreadable index is not fatal: the engine is returned
    /// without one and every `answer` reports [`AnswerError::IndexUnavailable`].
    #[inline]
    pub async fn load(index_path: &Path, embedder: E, generator: G, top_k: usize) -> Self {
        match VectorStore::open(index_path).await {
            Ok(store) => {
                info!("Loaded index from {:?}", index_path);
                Self::new(Some(store), embedder, generator, top_k)
            }
            Err(e) => {
                error!("Failed to load index from {:?}: {}", index_path, e);
                let mut engine = Self::new(None, embedder, generator, top_k);
                engine.load_error = Some(e.to_string());
                engine
            }
        }
    }

    #[inline]
    pub fn new(store: Option<VectorStore>, embedder: E, generator: G, top_k: usize) -> Self {
        Self {
            store,
            load_error: None,
            embedder,
            generator,
            top_k: top_k.max(1),
        }
    }

    /// Why the index could not be loaded, if it wasn't
    #[inline]
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.store.is_some()
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Fetch the `top_k` chunks nearest to `question`, closest first
    #[inline]
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>, AnswerError> {
        let store = self.store.as_ref().ok_or(AnswerError::IndexUnavailable)?;

        let query_vector = self
            .embedder
            .embed(question)
            .map_err(AnswerError::Embedding)?;

        let results = store
            .search_similar(&query_vector, self.top_k)
            .await
            .map_err(|e| AnswerError::Retrieval(e.to_string()))?;

        debug!("Retrieved {} passages", results.len());
        Ok(results)
    }

    #[inline]
    pub async fn answer(&self, question: &str) -> Result<Answer, AnswerError> {
        if self.store.is_none() {
            return Err(AnswerError::IndexUnavailable);
        }

        let passages = self.retrieve(question).await?;
        let prompt = build_prompt(
            question,
            passages.iter().map(|p| p.chunk_metadata.content.as_str()),
        );

        let text = self.generator.complete(&prompt).map_err(|e| {
            error!("Generation failed: {:#}", e);
            AnswerError::Generation(e)
        })?;

        let sources = passages
            .into_iter()
            .map(|p| format!("{}#{}", p.chunk_metadata.source, p.chunk_metadata.chunk_index))
            .collect::<Vec<_>>();
        info!("Answered from {} passages: {:?}", sources.len(), sources);

        Ok(Answer { text, sources })
    }
}
