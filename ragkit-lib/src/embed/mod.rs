//! Text embedding
//!
//! Two providers implement [`Embedder`]:
//!
//! - [`MiniLmEmbedder`]: `sentence-transformers/all-MiniLM-L6-v2` run
//!   locally via fastembed (ONNX runtime), behind the `local-embeddings`
//!   feature
//! - [`RemoteEmbedder`]: the same model family served by the HuggingFace
//!   feature-extraction endpoint
//!
//! # Usage
//!
//! ```ignore
//! use ragkit_lib::embed::{Embedder, MiniLmEmbedder};
//!
//! let mut embedder = MiniLmEmbedder::new()?;
//!
//! // Embed documents (for indexing)
//! let doc_embeddings = embedder.embed_documents(&["First chunk...", "Second chunk..."])?;
//!
//! // Embed query (for searching)
//! let query_embedding = embedder.embed_query("What is deepmind?")?;
//! ```

use crate::Result;

/// A vector embedding - fixed size array of floats
pub type Embedding = Vec<f32>;

/// Trait for text embedding models
pub trait Embedder: Send + Sync {
    /// Embed multiple documents for indexing
    ///
    /// Returns one embedding per input, in input order.
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Embed a single query for searching
    ///
    /// Models with asymmetric query prompts apply them here.
    fn embed_query(&mut self, text: &str) -> Result<Embedding>;

    /// Returns the embedding dimension
    fn dimension(&self) -> usize;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

#[cfg(feature = "local-embeddings")]
mod minilm;
mod remote;

#[cfg(feature = "local-embeddings")]
pub use minilm::*;
pub use remote::*;
