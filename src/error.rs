//! Error types for fetching and scraping.
//!
//! Only two classes of failure ever reach a caller: the index page could not
//! be fetched, or the request itself was malformed. Everything else (a link
//! that cannot be resolved, a detail page that times out) degrades to partial
//! data and is logged where it happens.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by a single outbound page fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Request-level and configuration errors.
#[derive(Debug, Error)]
pub enum NewsError {
    #[error("failed to fetch index page {url}")]
    IndexFetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid selector {name:?}: {css}")]
    InvalidSelector { name: String, css: String },
    #[error("invalid site configuration: {0}")]
    InvalidConfig(String),
}

impl NewsError {
    /// The innermost cause, for the `details` field of an error response.
    pub fn details(&self) -> Option<String> {
        match self {
            NewsError::IndexFetch { source, .. } => Some(source.to_string()),
            NewsError::InvalidRequest(msg) => Some(msg.clone()),
            _ => None,
        }
    }

    /// Whether the failure was caused by the caller rather than upstream.
    pub fn is_client_error(&self) -> bool {
        matches!(self, NewsError::InvalidRequest(_))
    }
}
