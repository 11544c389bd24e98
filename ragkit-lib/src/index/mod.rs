//! Similarity index over chunk embeddings
//!
//! Combines an embedder and a vector store: chunks are embedded once at build
//! time, queries are embedded per call.
//!
//! # Usage
//!
//! ```ignore
//! use ragkit_lib::index::Index;
//!
//! let mut index = Index::build(embedder, MemoryStore::new(), &chunks)?;
//! let retrieved = index.query("What is deepmind?", 4)?;
//! for result in &retrieved {
//!     println!("{:.4} {}", result.distance, result.chunk.content);
//! }
//! ```

use tracing::{debug, info};

use crate::chunk::Chunk;
use crate::embed::Embedder;
use crate::store::{MemoryStore, SearchResult, VectorStore};
use crate::{Error, Result};

/// The chunks nearest to one query, nearest first.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedSet {
    /// The query that produced this set
    pub query: String,
    /// Results ordered by non-decreasing distance
    pub results: Vec<SearchResult>,
}

impl RetrievedSet {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The retrieved chunks, nearest first.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.results.iter().map(|r| &r.chunk)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchResult> {
        self.results.iter()
    }
}

impl<'a> IntoIterator for &'a RetrievedSet {
    type Item = &'a SearchResult;
    type IntoIter = std::slice::Iter<'a, SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Embedding index: an embedder plus the store holding chunk vectors.
pub struct Index<E: Embedder, S: VectorStore = MemoryStore> {
    embedder: E,
    store: S,
}

impl<E: Embedder, S: VectorStore> Index<E, S> {
    /// Create an index over an existing store.
    #[must_use]
    pub fn new(embedder: E, store: S) -> Self {
        Self { embedder, store }
    }

    /// Create an index and add `chunks` to it.
    pub fn build(embedder: E, store: S, chunks: &[Chunk]) -> Result<Self> {
        let mut index = Self::new(embedder, store);
        index.add(chunks)?;
        Ok(index)
    }

    /// Embed chunks and store them.
    pub fn add(&mut self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedder.embed_documents(&texts)?;
        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(
                self.embedder.model_name(),
                format!(
                    "expected {} embeddings, got {}",
                    chunks.len(),
                    embeddings.len()
                ),
            ));
        }
        self.store.insert(chunks, &embeddings)?;

        info!(
            chunks = chunks.len(),
            model = self.embedder.model_name(),
            "indexed chunks"
        );
        Ok(())
    }

    /// Return the `k` chunks nearest to `text`, nearest first.
    pub fn query(&mut self, text: &str, k: usize) -> Result<RetrievedSet> {
        let query_embedding = self.embedder.embed_query(text)?;
        let results = self.store.search(&query_embedding, k)?;
        debug!(k, returned = results.len(), "retrieved chunks");

        Ok(RetrievedSet {
            query: text.to_string(),
            results,
        })
    }

    /// Returns the number of indexed chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if no chunks are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns a reference to the embedder.
    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Returns a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}
