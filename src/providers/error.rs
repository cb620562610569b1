use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Why a single provider call produced nothing usable.
///
/// "Not found" is never an error: providers return an empty page or `None`.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider task aborted: {0}")]
    Aborted(String),
}

impl ProviderError {
    pub fn parse(e: impl std::fmt::Display) -> Self {
        Self::Parse(e.to_string())
    }
}
