//! Document chunking strategies
//!
//! - [`FixedSizeChunker`]: fixed character windows with exact overlap.
//!   Dropping the overlap from every chunk after the first and concatenating
//!   gives back the original text.
//! - [`RecursiveChunker`]: splits on paragraphs, then lines, then words, then
//!   characters, merging pieces back up to the size limit
//!
//! All sizes are counted in characters (Unicode scalar values), not bytes.
//!
//! # Implementing a Chunker
//!
//! ```ignore
//! use ragkit_lib::chunk::{Chunker, Chunk, ChunkMetadata};
//!
//! struct MyChunker { /* ... */ }
//!
//! impl Chunker for MyChunker {
//!     fn chunk(&self, content: &str, metadata: ChunkMetadata) -> Vec<Chunk> {
//!         // Your chunking logic here
//!         todo!()
//!     }
//!
//!     fn name(&self) -> &str {
//!         "mine"
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::document::Document;

/// A chunk of text with its metadata
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Chunk {
    /// Identifier derived from source, position and content
    pub id: String,
    /// The text content of this chunk
    pub content: String,
    /// Metadata about the source and position
    pub metadata: ChunkMetadata,
}

/// Metadata associated with a chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct ChunkMetadata {
    /// Source document identifier
    pub source_id: Option<String>,
    /// Page within the source, for paged documents (0-indexed)
    pub page: Option<usize>,
    /// Character offset of the chunk start within the source text
    pub position: usize,
    /// Ordinal of this chunk within its source (0-indexed)
    pub index: usize,
    /// Total number of chunks from this source
    pub total_chunks: Option<usize>,
    /// Metadata inherited from the source document, minus the keys held
    /// by the typed fields above
    #[serde(flatten)]
    pub extra: HashMap<String, String>,
}

/// Document metadata keys that map onto typed fields. They are flattened
/// next to those fields, so keeping them in `extra` would serialize twice.
const TYPED_KEYS: [&str; 6] = ["source", "source_id", "page", "position", "index", "total_chunks"];

impl ChunkMetadata {
    /// Base metadata for chunks of `document`.
    pub fn for_document(document: &Document) -> Self {
        let extra = document
            .metadata
            .iter()
            .filter(|(key, _)| !TYPED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            source_id: Some(document.source().to_string()),
            page: document.page(),
            extra,
            ..Self::default()
        }
    }
}

/// Trait for document chunking strategies
pub trait Chunker: Send + Sync {
    /// Split content into chunks
    ///
    /// # Arguments
    /// * `content` - The text content to chunk
    /// * `metadata` - Base metadata to attach to each chunk
    ///
    /// # Returns
    /// Chunks in source order, with position, index and total filled in
    fn chunk(&self, content: &str, metadata: ChunkMetadata) -> Vec<Chunk>;

    /// Returns the name of this chunking strategy
    fn name(&self) -> &str;

    /// Chunk a document, inheriting its source, page and metadata.
    fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        self.chunk(&document.text, ChunkMetadata::for_document(document))
    }

    /// Chunk several documents, concatenating results in document order.
    fn chunk_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|d| self.chunk_document(d))
            .collect()
    }
}

/// Build a chunk, stamping its position and ordinal onto a copy of `base`.
pub(crate) fn make_chunk(content: &str, base: &ChunkMetadata, position: usize, index: usize) -> Chunk {
    let mut metadata = base.clone();
    metadata.position = position;
    metadata.index = index;

    Chunk {
        id: generate_id(base.source_id.as_deref(), position, content),
        content: content.to_string(),
        metadata,
    }
}

fn generate_id(source: Option<&str>, position: usize, content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    position.hash(&mut hasher);
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

mod fixed;
mod recursive;

pub use fixed::*;
pub use recursive::*;
