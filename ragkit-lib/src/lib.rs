//! ragkit - retrieval-augmented question answering over documents
//!
//! # Architecture
//!
//! ```text
//! Loader -> Document -> Chunker -> Embedder -> Store
//!                                                |
//! Question -> Embedder -> Index::query <---------+
//!                             |
//!                        RetrievedSet -> PromptAssembler -> Generator -> Answer
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ragkit_lib::{
//!     chunk::{Chunker, RecursiveChunker},
//!     config::Settings,
//!     embed::MiniLmEmbedder,
//!     generate::HuggingFaceChat,
//!     index::Index,
//!     ingest::{Loader, YouTubeTranscript},
//!     pipeline::{rag_chain, Stage},
//!     prompt::PromptAssembler,
//!     store::MemoryStore,
//! };
//!
//! let settings = Settings::from_env()?;
//! let docs = YouTubeTranscript::new("Gfr50f6ZBvo")?.load()?;
//! let chunks = RecursiveChunker::new(1000, 200)?.chunk_documents(&docs);
//!
//! let index = Index::build(MiniLmEmbedder::new()?, MemoryStore::new(), &chunks)?;
//! let mut chain = rag_chain(index, PromptAssembler::new()?, HuggingFaceChat::new(&settings)?, 4);
//! let answer = chain.run("Can you summarize the video".to_string())?;
//! ```

pub mod chat;
pub mod chunk;
pub mod config;
pub mod document;
pub mod embed;
pub mod error;
pub mod generate;
mod http;
pub mod index;
pub mod ingest;
pub mod pipeline;
pub mod prompt;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
