//! Document sources
//!
//! Each loader turns one external source into [`Document`]s:
//!
//! - [`YouTubeTranscript`]: caption track of a video, flattened to one document
//! - [`TextLoader`]: a UTF-8 text file
//! - [`PdfLoader`]: one document per PDF page
//! - [`WikipediaRetriever`]: pages matching a search query
//!
//! Loaders never retry. An unreachable or empty source is reported as
//! [`Error::SourceUnavailable`](crate::Error::SourceUnavailable).

use crate::document::Document;
use crate::Result;

/// Trait for document sources
pub trait Loader {
    /// Load every document from the source, in source order.
    fn load(&self) -> Result<Vec<Document>>;
}

mod pdf;
mod text;
mod transcript;
mod wikipedia;

pub use pdf::*;
pub use text::*;
pub use transcript::*;
pub use wikipedia::*;
