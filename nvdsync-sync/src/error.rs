//! Error types for nvdsync-sync.

use std::path::PathBuf;

use thiserror::Error;

use nvdsync_core::{CoreError, FeedPartition};
use nvdsync_feed::FeedError;

/// All fatal errors that can arise from an update run.
///
/// Per-record identifier problems are not errors; see
/// [`SkipReason`](crate::writer::SkipReason).
#[derive(Debug, Error)]
pub enum SyncError {
    /// Metadata for an incremental partition could not be retrieved, so
    /// staleness cannot be decided.
    #[error("metadata retrieval failed for '{partition}': {source}")]
    Metadata {
        partition: FeedPartition,
        #[source]
        source: FeedError,
    },

    /// A partition payload could not be retrieved or decoded.
    #[error("payload retrieval failed for '{partition}': {source}")]
    Fetch {
        partition: FeedPartition,
        #[source]
        source: FeedError,
    },

    /// Checkpoint or config failure from the core crate.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Record serialization failure.
    #[error("record JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A fetch worker ended without reporting a result or an error.
    #[error("fetch worker exited without reporting ({remaining} partition(s) outstanding)")]
    WorkerLost { remaining: usize },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
