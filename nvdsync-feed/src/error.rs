//! Error types for nvdsync-feed.

use thiserror::Error;

/// All errors that can arise while retrieving a feed partition.
///
/// `Transport`, `Status` and `Meta` are retrieval failures; `Decode` means the
/// bytes arrived but could not be turned into a feed document.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The `.meta` body did not carry a usable `lastModifiedDate`.
    #[error("invalid metadata from {url}: {reason}")]
    Meta { url: String, reason: String },

    /// Gzip or JSON decoding of the payload failed.
    #[error("failed to decode payload from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FeedError {
    /// The URL the failing request was sent to.
    pub fn url(&self) -> &str {
        match self {
            FeedError::Transport { url, .. }
            | FeedError::Status { url, .. }
            | FeedError::Meta { url, .. }
            | FeedError::Decode { url, .. } => url,
        }
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, FeedError::Decode { .. })
    }
}
