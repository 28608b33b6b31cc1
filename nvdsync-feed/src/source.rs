//! Transport boundary between the sync orchestrator and the data source.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use nvdsync_core::FeedPartition;

use crate::document::FeedDocument;
use crate::error::FeedError;

/// Something that can answer "when did this partition last change" and
/// "give me this partition's records".
///
/// Implementations perform a single attempt per call: no retries, no
/// fallback mirrors, no caching of partial results.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Remote last-modified timestamp of `partition`.
    async fn last_modified(&self, partition: FeedPartition) -> Result<DateTime<Utc>, FeedError>;

    /// Download and decode the full payload of `partition`.
    async fn fetch(&self, partition: FeedPartition) -> Result<FeedDocument, FeedError>;
}

#[async_trait]
impl<S: FeedSource + ?Sized> FeedSource for Arc<S> {
    async fn last_modified(&self, partition: FeedPartition) -> Result<DateTime<Utc>, FeedError> {
        (**self).last_modified(partition).await
    }

    async fn fetch(&self, partition: FeedPartition) -> Result<FeedDocument, FeedError> {
        (**self).fetch(partition).await
    }
}
