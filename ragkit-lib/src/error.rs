//! Error types for ragkit

use thiserror::Error;

use crate::schema::ValidationErrors;

/// Result type alias for ragkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ragkit operations
#[derive(Error, Debug)]
pub enum Error {
    /// A document source could not be read (captions disabled, file missing, ...)
    #[error("source unavailable ({id}): {reason}")]
    SourceUnavailable { id: String, reason: String },

    /// The embedding provider failed or returned something unusable
    #[error("embedding error ({provider}): {message}")]
    EmbeddingProvider { provider: String, message: String },

    /// The hosted generation model failed (network, auth, bad response)
    #[error("generation error ({provider}): {message}")]
    GenerationProvider { provider: String, message: String },

    /// The provider throttled the request
    #[error("rate limited by {provider}{}", retry_hint(.retry_after_secs))]
    RateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// A required credential was not present in the environment
    #[error("configuration missing: {0} is not set")]
    ConfigurationMissing(String),

    /// A configuration value was present but malformed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A prompt template could not be parsed or formatted
    #[error("template error: {0}")]
    Template(String),

    /// Failed to store or retrieve from vector store
    #[error("store error: {0}")]
    Store(String),

    /// Invalid input provided
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A structured record failed validation
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

fn retry_hint(secs: &Option<u64>) -> String {
    match secs {
        Some(s) => format!(", retry after {s}s"),
        None => String::new(),
    }
}

impl Error {
    pub(crate) fn source_unavailable(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingProvider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub(crate) fn generation(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GenerationProvider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_display() {
        let err = Error::RateLimited {
            provider: "huggingface".into(),
            retry_after_secs: Some(12),
        };
        assert_eq!(err.to_string(), "rate limited by huggingface, retry after 12s");

        let err = Error::RateLimited {
            provider: "huggingface".into(),
            retry_after_secs: None,
        };
        assert_eq!(err.to_string(), "rate limited by huggingface");
    }

    #[test]
    fn test_configuration_missing_display() {
        let err = Error::ConfigurationMissing("HUGGINGFACEHUB_API_TOKEN".into());
        assert_eq!(
            err.to_string(),
            "configuration missing: HUGGINGFACEHUB_API_TOKEN is not set"
        );
    }
}
