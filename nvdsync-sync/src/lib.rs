//! # nvdsync-sync
//!
//! Staleness resolution, record writing and update orchestration.
//!
//! Call [`run_update`] to bring a work directory up to date from a
//! [`FeedSource`](nvdsync_feed::FeedSource), or [`pipeline::plan`] to see
//! what a run would fetch without downloading anything.

pub mod error;
pub mod pipeline;
pub mod progress;
pub mod staleness;
pub mod writer;

pub use error::SyncError;
pub use pipeline::{run_update, run_update_with_progress, UpdateOptions, UpdateOutcome};
pub use progress::{ProgressCallback, UpdateProgress};
pub use staleness::{PartitionStatus, Plan, StalenessPolicy};
pub use writer::{DocumentSummary, SkipReason, WriteResult};
