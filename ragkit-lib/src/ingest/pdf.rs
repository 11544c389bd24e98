use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::document::Document;
use crate::ingest::Loader;
use crate::{Error, Result};

/// Loads a PDF as one document per page.
///
/// Each page document carries `source` (the path), `page` (0-indexed) and
/// `total_pages` metadata.
#[derive(Debug, Clone)]
pub struct PdfLoader {
    path: PathBuf,
}

impl PdfLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Parse an in-memory PDF, labelling pages with `source`.
    pub fn load_bytes(source: &str, data: &[u8]) -> Result<Vec<Document>> {
        let pdf = lopdf::Document::load_mem(data)
            .map_err(|e| Error::source_unavailable(source, format!("not a readable PDF: {e}")))?;
        Ok(pages(source, &pdf))
    }
}

impl Loader for PdfLoader {
    fn load(&self) -> Result<Vec<Document>> {
        let source = self.path.display().to_string();
        let pdf = lopdf::Document::load(&self.path)
            .map_err(|e| Error::source_unavailable(&source, e.to_string()))?;
        Ok(pages(&source, &pdf))
    }
}

fn pages(source: &str, pdf: &lopdf::Document) -> Vec<Document> {
    let numbers: Vec<u32> = pdf.get_pages().into_keys().collect();
    let total = numbers.len();
    debug!(source, pages = total, "parsed PDF");

    numbers
        .into_iter()
        .enumerate()
        .map(|(page, number)| {
            // unreadable pages stay in place as empty text
            let text = pdf.extract_text(&[number]).unwrap_or_else(|e| {
                warn!(source, page, error = %e, "failed to extract page text");
                String::new()
            });

            Document::new(format!("{source}#page={page}"), text)
                .with_metadata("source", source)
                .with_metadata("page", page.to_string())
                .with_metadata("total_pages", total.to_string())
        })
        .collect()
}
