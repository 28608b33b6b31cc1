//! Progress events emitted while an update runs.
//!
//! The pipeline reports through an optional callback so front ends can draw
//! a bar without the library depending on a terminal.

use nvdsync_core::FeedPartition;

use crate::writer::DocumentSummary;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum UpdateProgress {
    /// Downloads are about to start.
    FetchStarted {
        /// Partitions scheduled for this run.
        total: usize,
        /// Bound on in-flight downloads.
        concurrency: usize,
    },

    /// One partition was downloaded and written.
    PartitionSaved {
        partition: FeedPartition,
        /// Partitions finished so far, including this one.
        done: usize,
        total: usize,
        summary: DocumentSummary,
    },
}

/// Callback for progress updates during a run.
pub type ProgressCallback = Box<dyn Fn(UpdateProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: UpdateProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
