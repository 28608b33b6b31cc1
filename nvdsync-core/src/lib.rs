//! nvdsync core library: domain types, checkpoint persistence, config, errors.
//!
//! - [`types`]: [`FeedPartition`] and [`RecordId`]
//! - [`checkpoint`]: load / save of the last-successful-sync timestamp
//! - [`config`]: `nvdsync.yaml` loading with defaults
//! - [`error`]: [`CoreError`]

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod types;

pub use checkpoint::Checkpoint;
pub use config::Config;
pub use error::CoreError;
pub use types::{FeedPartition, PartitionParseError, RecordId, RecordIdError};
