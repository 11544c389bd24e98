//! Blocking HTTP plumbing shared by the hosted providers

use reqwest::blocking::{Client, Response};
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::error;

use crate::{Error, Result};

pub(crate) fn client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("ragkit/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::InvalidConfig(format!("http client: {e}")))
}

/// Which error family a failed call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProviderKind {
    Embedding,
    Generation,
}

impl ProviderKind {
    pub(crate) fn error(self, provider: &str, message: impl Into<String>) -> Error {
        match self {
            Self::Embedding => Error::embedding(provider, message),
            Self::Generation => Error::generation(provider, message),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Nested { error: ErrorDetail },
    Flat { error: String },
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Pull a human-readable message out of an error body, else return it raw.
pub(crate) fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody::Nested { error }) => error.message,
        Ok(ErrorBody::Flat { error }) => error,
        Err(_) => body.trim().to_string(),
    }
}

/// Map a non-success status to an error. 429 is always [`Error::RateLimited`].
pub(crate) fn status_error(
    kind: ProviderKind,
    provider: &str,
    status: StatusCode,
    retry_after_secs: Option<u64>,
    body: &str,
) -> Error {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Error::RateLimited {
            provider: provider.to_string(),
            retry_after_secs,
        };
    }
    kind.error(
        provider,
        format!("API returned {status}: {}", error_detail(body)),
    )
}

/// Pass a successful response through, or turn a failed one into an error.
pub(crate) fn check(kind: ProviderKind, provider: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok());
    let body = response.text().unwrap_or_default();

    error!(provider, %status, "API error");
    Err(status_error(kind, provider, status, retry_after, &body))
}
