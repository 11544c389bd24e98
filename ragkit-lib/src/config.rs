//! Runtime configuration
//!
//! Two explicit values are built once at startup and handed to the
//! components that need them:
//!
//! - [`Settings`]: provider credentials and model ids, read from the
//!   environment (after loading a local `.env` file)
//! - [`RagConfig`]: chunking and retrieval parameters, validated by its builder
//!
//! A missing token is not an error here. It surfaces as
//! [`Error::ConfigurationMissing`] on the first call that needs it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

pub const TOKEN_VAR: &str = "HUGGINGFACEHUB_API_TOKEN";
pub const TOKEN_FALLBACK_VAR: &str = "HF_TOKEN";
pub const BASE_URL_VAR: &str = "RAGKIT_HF_BASE_URL";
pub const CHAT_MODEL_VAR: &str = "RAGKIT_CHAT_MODEL";
pub const EMBEDDING_MODEL_VAR: &str = "RAGKIT_EMBEDDING_MODEL";
pub const TEMPERATURE_VAR: &str = "RAGKIT_TEMPERATURE";

pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co";
pub const DEFAULT_CHAT_MODEL: &str = "HuggingFaceH4/zephyr-7b-beta";
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Provider credentials and model selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// HuggingFace API token, if configured
    pub hf_token: Option<String>,
    /// Base URL of the HuggingFace router
    pub hf_base_url: String,
    /// Repository id of the chat model
    pub chat_model: String,
    /// Repository id of the embedding model
    pub embedding_model: String,
    /// Sampling temperature for generation
    pub temperature: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hf_token: None,
            hf_base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl Settings {
    /// Load `.env` (if present) and read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(Error::InvalidConfig(format!(".env: {e}"))),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let temperature = match get(TEMPERATURE_VAR) {
            Some(raw) => {
                let t: f32 = raw.trim().parse().map_err(|_| {
                    Error::InvalidConfig(format!("{TEMPERATURE_VAR}={raw} is not a number"))
                })?;
                if !(0.0..=2.0).contains(&t) {
                    return Err(Error::InvalidConfig(format!(
                        "{TEMPERATURE_VAR} must be between 0 and 2, got {t}"
                    )));
                }
                t
            }
            None => defaults.temperature,
        };

        Ok(Self {
            hf_token: get(TOKEN_VAR).or_else(|| get(TOKEN_FALLBACK_VAR)),
            hf_base_url: get(BASE_URL_VAR)
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.hf_base_url),
            chat_model: get(CHAT_MODEL_VAR).unwrap_or(defaults.chat_model),
            embedding_model: get(EMBEDDING_MODEL_VAR).unwrap_or(defaults.embedding_model),
            temperature,
        })
    }

    /// The API token, or [`Error::ConfigurationMissing`].
    pub fn require_token(&self) -> Result<&str> {
        self.hf_token
            .as_deref()
            .ok_or_else(|| Error::ConfigurationMissing(TOKEN_VAR.to_string()))
    }
}

/// Chunking and retrieval parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question
    pub top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
        }
    }
}

impl RagConfig {
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Build the config.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if `chunk_overlap >= chunk_size` or `top_k == 0`.
    pub fn build(self) -> Result<RagConfig> {
        let c = self.config;
        if c.chunk_overlap >= c.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        if c.top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be greater than zero".into()));
        }
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.hf_token.is_none());
    }

    #[test]
    fn test_missing_token_fails_on_require() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        let err = settings.require_token().unwrap_err();
        assert!(matches!(err, Error::ConfigurationMissing(ref v) if v == TOKEN_VAR));
    }

    #[test]
    fn test_token_fallback() {
        let settings = Settings::from_lookup(lookup(&[(TOKEN_FALLBACK_VAR, "hf_abc")])).unwrap();
        assert_eq!(settings.require_token().unwrap(), "hf_abc");

        let settings = Settings::from_lookup(lookup(&[
            (TOKEN_VAR, "hf_primary"),
            (TOKEN_FALLBACK_VAR, "hf_abc"),
        ]))
        .unwrap();
        assert_eq!(settings.require_token().unwrap(), "hf_primary");
    }

    #[test]
    fn test_blank_token_is_unset() {
        let settings = Settings::from_lookup(lookup(&[(TOKEN_VAR, "   ")])).unwrap();
        assert!(settings.hf_token.is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            (BASE_URL_VAR, "http://localhost:8080/"),
            (CHAT_MODEL_VAR, "mistralai/Mistral-7B-Instruct-v0.2"),
            (TEMPERATURE_VAR, "0.2"),
        ]))
        .unwrap();
        assert_eq!(settings.hf_base_url, "http://localhost:8080");
        assert_eq!(settings.chat_model, "mistralai/Mistral-7B-Instruct-v0.2");
        assert!((settings.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bad_temperature() {
        let err = Settings::from_lookup(lookup(&[(TEMPERATURE_VAR, "hot")])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = Settings::from_lookup(lookup(&[(TEMPERATURE_VAR, "3.5")])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_rag_config_defaults_valid() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config, RagConfig::default());
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.top_k, 4);
    }

    #[test]
    fn test_rag_config_rejects_overlap() {
        let err = RagConfig::builder()
            .chunk_size(100)
            .chunk_overlap(100)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_rag_config_rejects_zero_k() {
        assert!(RagConfig::builder().top_k(0).build().is_err());
    }
}
