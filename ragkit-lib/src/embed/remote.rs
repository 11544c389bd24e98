use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{debug, error};

use crate::config::Settings;
use crate::embed::{Embedder, Embedding};
use crate::http::{self, ProviderKind};
use crate::{Error, Result};

const PROVIDER: &str = "huggingface";

/// Output size of the default model (all-MiniLM-L6-v2).
const DEFAULT_DIMENSION: usize = 384;

/// Embedder backed by the HuggingFace feature-extraction endpoint.
///
/// The API token is read from [`Settings`] on each call, so a missing token
/// is reported as [`Error::ConfigurationMissing`] by the first request.
pub struct RemoteEmbedder {
    client: Client,
    settings: Settings,
    dimension: usize,
}

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [&'a str],
}

impl RemoteEmbedder {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: http::client()?,
            settings: settings.clone(),
            dimension: DEFAULT_DIMENSION,
        })
    }

    /// Expected vector length; responses of any other length are rejected.
    #[must_use]
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/hf-inference/models/{}/pipeline/feature-extraction",
            self.settings.hf_base_url, self.settings.embedding_model
        )
    }

    fn request(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let token = self.settings.require_token()?;
        debug!(
            provider = PROVIDER,
            model = %self.settings.embedding_model,
            batch_size = texts.len(),
            "embedding batch"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(token)
            .json(&FeatureExtractionRequest { inputs: texts })
            .send()
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                Error::embedding(PROVIDER, format!("request failed: {e}"))
            })?;

        let body = http::check(ProviderKind::Embedding, PROVIDER, response)?
            .text()
            .map_err(|e| Error::embedding(PROVIDER, format!("failed to read response: {e}")))?;

        parse_embeddings(&body, texts.len(), self.dimension)
    }
}

/// Decode a feature-extraction response and check its shape.
fn parse_embeddings(body: &str, expected: usize, dimension: usize) -> Result<Vec<Embedding>> {
    let vectors: Vec<Embedding> = serde_json::from_str(body)
        .map_err(|e| Error::embedding(PROVIDER, format!("failed to parse response: {e}")))?;

    if vectors.len() != expected {
        return Err(Error::embedding(
            PROVIDER,
            format!("expected {expected} embeddings, got {}", vectors.len()),
        ));
    }
    if let Some(v) = vectors.iter().find(|v| v.len() != dimension) {
        return Err(Error::embedding(
            PROVIDER,
            format!("expected dimension {dimension}, got {}", v.len()),
        ));
    }
    Ok(vectors)
}

impl Embedder for RemoteEmbedder {
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts)
    }

    fn embed_query(&mut self, text: &str) -> Result<Embedding> {
        self.request(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding(PROVIDER, "API returned empty response"))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.settings.embedding_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_embeddings() {
        let body = "[[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]";
        let out = parse_embeddings(body, 2, 3).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], vec![0.4, 0.5, 0.6]);
    }

    #[test]
    fn test_parse_rejects_wrong_count() {
        let err = parse_embeddings("[[0.1, 0.2]]", 2, 2).unwrap_err();
        assert!(matches!(err, Error::EmbeddingProvider { .. }));
    }

    #[test]
    fn test_parse_rejects_wrong_dimension() {
        let err = parse_embeddings("[[0.1, 0.2]]", 1, 384).unwrap_err();
        assert!(err.to_string().contains("dimension"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_embeddings(r#"{"estimated_time": 20.0}"#, 1, 3).unwrap_err();
        assert!(matches!(err, Error::EmbeddingProvider { .. }));
    }

    #[test]
    fn test_missing_token_fails_before_request() {
        let settings = Settings::default();
        let mut embedder = RemoteEmbedder::new(&settings).unwrap();
        let err = embedder.embed_query("hello").unwrap_err();
        assert!(matches!(err, Error::ConfigurationMissing(_)));
    }

    #[test]
    fn test_empty_batch_is_free() {
        let mut embedder = RemoteEmbedder::new(&Settings::default()).unwrap();
        assert!(embedder.embed_documents(&[]).unwrap().is_empty());
    }
}
