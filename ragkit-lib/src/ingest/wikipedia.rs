use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::http;
use crate::{Error, Result};

pub const DEFAULT_TOP_K_RESULTS: usize = 3;
pub const DEFAULT_DOC_CONTENT_CHARS_MAX: usize = 4000;

/// Retrieves Wikipedia pages relevant to a free-text query.
///
/// A MediaWiki full-text search picks the titles, then each page's plain-text
/// extract becomes one [`Document`] with `title` and `source` (page URL)
/// metadata.
pub struct WikipediaRetriever {
    client: Client,
    api_url: Option<String>,
    lang: String,
    top_k_results: usize,
    doc_content_chars_max: usize,
}

impl WikipediaRetriever {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: http::client()?,
            api_url: None,
            lang: "en".to_string(),
            top_k_results: DEFAULT_TOP_K_RESULTS,
            doc_content_chars_max: DEFAULT_DOC_CONTENT_CHARS_MAX,
        })
    }

    /// Wikipedia language edition, e.g. `"en"` or `"de"`.
    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    #[must_use]
    pub fn with_top_k_results(mut self, top_k_results: usize) -> Self {
        self.top_k_results = top_k_results;
        self
    }

    #[must_use]
    pub fn with_doc_content_chars_max(mut self, max: usize) -> Self {
        self.doc_content_chars_max = max;
        self
    }

    /// Point at another MediaWiki `api.php`.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    fn api_url(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| format!("https://{}.wikipedia.org/w/api.php", self.lang))
    }

    /// Search and fetch up to `top_k_results` pages for `query`.
    pub fn retrieve(&self, query: &str) -> Result<Vec<Document>> {
        if self.top_k_results == 0 {
            return Ok(Vec::new());
        }

        let limit = self.top_k_results.to_string();
        let body = self.get(
            query,
            &[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", &limit),
                ("format", "json"),
                ("formatversion", "2"),
            ],
        )?;
        let titles = parse_search(&body).map_err(|e| Error::source_unavailable(query, e))?;
        debug!(query, hits = titles.len(), "wikipedia search");

        let mut docs = Vec::with_capacity(titles.len());
        for title in titles.into_iter().take(self.top_k_results) {
            let body = self.get(
                &title,
                &[
                    ("action", "query"),
                    ("prop", "extracts"),
                    ("explaintext", "1"),
                    ("redirects", "1"),
                    ("titles", &title),
                    ("format", "json"),
                    ("formatversion", "2"),
                ],
            )?;
            match parse_extract(&body) {
                Ok(Some(page)) => docs.push(page_document(&self.lang, page, self.doc_content_chars_max)),
                Ok(None) => warn!(title = %title, "page has no extract"),
                Err(e) => return Err(Error::source_unavailable(title, e)),
            }
        }

        info!(query, documents = docs.len(), "retrieved wikipedia pages");
        Ok(docs)
    }

    fn get(&self, id: &str, params: &[(&str, &str)]) -> Result<String> {
        let response = self
            .client
            .get(self.api_url())
            .query(params)
            .send()
            .map_err(|e| Error::source_unavailable(id, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::source_unavailable(id, format!("wikipedia returned {status}")));
        }
        response
            .text()
            .map_err(|e| Error::source_unavailable(id, e.to_string()))
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    query: SearchQuery,
}

#[derive(Deserialize)]
struct SearchQuery {
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct ExtractResponse {
    query: ExtractQuery,
}

#[derive(Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<WikiPage>,
}

/// A page title with its plain-text extract.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WikiPage {
    pub title: String,
    #[serde(default)]
    pub extract: Option<String>,
    #[serde(default)]
    missing: bool,
}

/// Titles from a `list=search` response, best match first.
pub fn parse_search(body: &str) -> std::result::Result<Vec<String>, String> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| format!("unexpected search response: {e}"))?;
    Ok(response.query.search.into_iter().map(|hit| hit.title).collect())
}

/// The page from a `prop=extracts` response, if it exists and has text.
pub fn parse_extract(body: &str) -> std::result::Result<Option<WikiPage>, String> {
    let response: ExtractResponse =
        serde_json::from_str(body).map_err(|e| format!("unexpected extract response: {e}"))?;
    Ok(response
        .query
        .pages
        .into_iter()
        .find(|p| !p.missing && p.extract.as_deref().is_some_and(|e| !e.trim().is_empty())))
}

fn page_document(lang: &str, page: WikiPage, max_chars: usize) -> Document {
    let text: String = page
        .extract
        .as_deref()
        .unwrap_or_default()
        .chars()
        .take(max_chars)
        .collect();
    let url = page_url(lang, &page.title);

    Document::new(url.clone(), text)
        .with_metadata("title", page.title)
        .with_metadata("source", url)
}

/// Canonical article URL for `title`.
pub fn page_url(lang: &str, title: &str) -> String {
    format!("https://{lang}.wikipedia.org/wiki/{}", title.replace(' ', "_"))
}
