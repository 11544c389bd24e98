use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::document::Document;
use crate::ingest::Loader;
use crate::{Error, Result};

/// Loads a UTF-8 text file as a single document.
#[derive(Debug, Clone)]
pub struct TextLoader {
    path: PathBuf,
}

impl TextLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Loader for TextLoader {
    fn load(&self) -> Result<Vec<Document>> {
        let source = self.path.display().to_string();
        let text = fs::read_to_string(&self.path)
            .map_err(|e| Error::source_unavailable(&source, e.to_string()))?;
        debug!(source = %source, chars = text.chars().count(), "loaded text file");

        Ok(vec![Document::new(&source, text).with_metadata("source", &source)])
    }
}
