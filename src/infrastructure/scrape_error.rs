//! Error taxonomy for a single scrape invocation
//!
//! Every failure is scoped to one invocation. Validation and fetch errors
//! abort before extraction; `NotFound` is the "reachable page, no data"
//! outcome. Per-field misses are never errors.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScrapeError {
    #[error("Invalid item id '{item_id}': {reason}")]
    Validation { item_id: String, reason: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network failure while fetching {url}: {message}")]
    NetworkFailure { url: String, message: String },

    #[error("Fetching {url} exceeded the {deadline:?} deadline")]
    Timeout { url: String, deadline: Duration },

    #[error("HTTP request failed with status {status}: {url}")]
    HttpStatus { url: String, status: u16 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("No item data found on {url}")]
    NotFound { url: String },
}

/// Stable, machine-readable failure kind for the outer HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NetworkFailure,
    Timeout,
    HttpStatus,
    NotFound,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NetworkFailure => "network_failure",
            Self::Timeout => "timeout",
            Self::HttpStatus => "http_status",
            Self::NotFound => "not_found",
        }
    }
}

impl ScrapeError {
    /// Create a validation error for a rejected identifier
    pub fn validation(item_id: &str, reason: &str) -> Self {
        Self::Validation {
            item_id: item_id.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a not-found error for a page that yielded no fields
    pub fn not_found(url: &str) -> Self {
        Self::Extraction(ExtractionError::NotFound {
            url: url.to_string(),
        })
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Fetch(fetch) => fetch.kind(),
            Self::Extraction(ExtractionError::NotFound { .. }) => ErrorKind::NotFound,
        }
    }
}

impl FetchError {
    pub fn network_failure(url: &str, message: impl Into<String>) -> Self {
        Self::NetworkFailure {
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn timeout(url: &str, deadline: Duration) -> Self {
        Self::Timeout {
            url: url.to_string(),
            deadline,
        }
    }

    pub fn http_status(url: &str, status: u16) -> Self {
        Self::HttpStatus {
            url: url.to_string(),
            status,
        }
    }

    /// Only transport-level failures are worth the single retry.
    /// Non-2xx statuses and deadline expiry are final.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkFailure { .. })
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NetworkFailure { .. } => ErrorKind::NetworkFailure,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::HttpStatus { .. } => ErrorKind::HttpStatus,
        }
    }
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
