//! Error taxonomy shared by the fetch, extraction and persistence layers.
//!
//! Every variant aborts the work item it occurs in. The aggregator is the
//! only place that downgrades an error (episode-level failures are logged
//! and the episode is dropped).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Transport failure (`status` is `None`) or a non-2xx response.
    #[error("fetch of {url} failed{}: {message}", .status.map(|s| format!(" with status {s}")).unwrap_or_default())]
    Fetch {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// The rendering proxy answered 2xx but the payload was unusable.
    #[error("rendering proxy returned a malformed response for {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("profile {url} is missing required field `{field}`")]
    Validation { url: String, field: &'static str },

    #[error("failed to persist profile {url}: {message}")]
    Persistence { url: String, message: String },

    /// Pool or worklist failure; fatal for the whole run.
    #[error("database error: {0}")]
    Database(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ScrapeError {
    pub fn transport(url: &str, err: reqwest::Error) -> Self {
        ScrapeError::Fetch {
            url: url.to_string(),
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    pub fn persistence(url: &str, err: impl std::fmt::Display) -> Self {
        ScrapeError::Persistence {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}
