//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{CatalogError, Category};

/// Errors emitted by a `CatalogProvider` for a single fetch attempt.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("unknown category: {0}")]
    UnknownCategory(Category),
    #[error("catalog request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed catalog data: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] CatalogError),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Malformed payloads and unknown categories fail the same way every time.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::HttpStatus(_) | FetchError::Io(_) => true,
            FetchError::Http(err) => !err.is_decode(),
            FetchError::UnknownCategory(_) | FetchError::Decode(_) | FetchError::Invalid(_) => {
                false
            }
        }
    }
}

/// Final failure of `CatalogLoader::load` once the retry budget is spent.
#[derive(Debug, Error)]
#[error("could not load category after {attempts} attempt(s): {source}")]
pub struct LoadError {
    pub attempts: u32,
    #[source]
    pub source: FetchError,
}

/// Errors emitted while reading `ExamConfig` from the environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{var} must be a valid {expected}, got {value:?}")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("invalid catalog url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Errors surfaced by `SessionHandle`.
///
/// Session events themselves never fail; illegal events are ignored by the
/// controller. The only failure is talking to a runtime that has stopped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session runtime has shut down")]
    Closed,
}
