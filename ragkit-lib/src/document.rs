//! Source documents produced by loaders

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A unit of raw text plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Identifier of this document (video id, `path#page=N`, page title)
    pub id: String,
    /// The raw text
    pub text: String,
    /// Loader-specific metadata (`source`, `page`, `language`, `title`)
    pub metadata: HashMap<String, String>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The `source` metadata entry, falling back to the id.
    pub fn source(&self) -> &str {
        self.metadata.get("source").map_or(&self.id, String::as_str)
    }

    /// The 0-indexed `page` metadata entry, if present and numeric.
    pub fn page(&self) -> Option<usize> {
        self.metadata.get("page").and_then(|p| p.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_falls_back_to_id() {
        let doc = Document::new("Gfr50f6ZBvo", "text");
        assert_eq!(doc.source(), "Gfr50f6ZBvo");

        let doc = doc.with_metadata("source", "resume.pdf");
        assert_eq!(doc.source(), "resume.pdf");
    }

    #[test]
    fn test_page() {
        let doc = Document::new("a", "b").with_metadata("page", "3");
        assert_eq!(doc.page(), Some(3));
        assert_eq!(Document::new("a", "b").page(), None);
    }
}
