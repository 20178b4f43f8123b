//! Client error types.

use thiserror::Error;

use crate::endpoints::MediaKind;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{kind} generation failed: all {attempts} endpoint(s) exhausted (last error: {last_error})")]
    AllEndpointsFailed {
        kind: MediaKind,
        attempts: usize,
        last_error: String,
    },

    #[error("Upstream returned status {status} for {kind} request")]
    BadStatus { kind: MediaKind, status: u16 },

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn all_endpoints_failed(
        kind: MediaKind,
        attempts: usize,
        last_error: impl Into<String>,
    ) -> Self {
        Self::AllEndpointsFailed {
            kind,
            attempts,
            last_error: last_error.into(),
        }
    }

    /// Terminal for the logical request: every fallback was tried.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, ClientError::AllEndpointsFailed { .. })
    }
}
