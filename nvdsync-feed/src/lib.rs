//! # nvdsync-feed
//!
//! Retrieval of feed partitions from the upstream data source.
//!
//! [`FeedSource`] is the transport boundary used by the sync orchestrator;
//! [`HttpFeedSource`] is the real implementation backed by reqwest.

pub mod document;
pub mod error;
pub mod http;
pub mod meta;
pub mod source;

pub use document::FeedDocument;
pub use error::FeedError;
pub use http::HttpFeedSource;
pub use source::FeedSource;
