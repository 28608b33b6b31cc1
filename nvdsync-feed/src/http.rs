//! reqwest-backed [`FeedSource`].
//!
//! URL shapes, with `<partition>` one of `modified`, `recent` or a year:
//!
//! ```text
//! <base_url>/nvdcve-<version>-<partition>.meta
//! <base_url>/nvdcve-<version>-<partition>.json.gz
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use nvdsync_core::{config::FeedConfig, FeedPartition};

use crate::document::{decode_gzip, FeedDocument};
use crate::error::FeedError;
use crate::meta::parse_last_modified;
use crate::source::FeedSource;

/// Fetches partitions over HTTP(S). Cheap to clone; clones share the
/// underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
    base_url: String,
    version: String,
}

impl HttpFeedSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            version: version.into(),
        }
    }

    /// Build a client from the `feed` section of the config.
    pub fn from_config(config: &FeedConfig) -> Result<Self, FeedError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| FeedError::Transport {
            url: config.base_url.clone(),
            source: e,
        })?;
        Ok(Self::new(client, config.base_url.clone(), config.version.clone()))
    }

    pub fn meta_url(&self, partition: FeedPartition) -> String {
        format!("{}/nvdcve-{}-{}.meta", self.base_url, self.version, partition)
    }

    pub fn payload_url(&self, partition: FeedPartition) -> String {
        format!("{}/nvdcve-{}-{}.json.gz", self.base_url, self.version, partition)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FeedError> {
        let transport = |e| FeedError::Transport {
            url: url.to_string(),
            source: e,
        };
        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn last_modified(&self, partition: FeedPartition) -> Result<DateTime<Utc>, FeedError> {
        let url = self.meta_url(partition);
        tracing::info!("fetching metadata ({partition}): {url}");
        let body = self.get_bytes(&url).await?;
        parse_last_modified(&String::from_utf8_lossy(&body), &url)
    }

    async fn fetch(&self, partition: FeedPartition) -> Result<FeedDocument, FeedError> {
        let url = self.payload_url(partition);
        tracing::debug!("fetching payload ({partition}): {url}");
        let body = self.get_bytes(&url).await?;
        let document = decode_gzip(&body, &url)?;
        tracing::debug!(
            "decoded {} records from {} bytes ({partition})",
            document.len(),
            body.len()
        );
        Ok(document)
    }
}
