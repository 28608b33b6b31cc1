//! Decoded feed payloads.
//!
//! The payload is a gzip-compressed JSON object whose `CVE_Items` array holds
//! the records. Records are kept as raw [`serde_json::Value`]s: the writer
//! re-serializes them verbatim and only looks at the identifier path.

use std::io::Read;

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FeedError;

/// One decoded feed partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedDocument {
    #[serde(rename = "CVE_Items", default)]
    pub items: Vec<Value>,
}

impl FeedDocument {
    pub fn new(items: Vec<Value>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Gunzip and decode a payload body. `url` is only used for error context.
pub fn decode_gzip(body: &[u8], url: &str) -> Result<FeedDocument, FeedError> {
    decode_json(GzDecoder::new(body), url)
}

/// Decode an already-decompressed payload.
pub fn decode_json(reader: impl Read, url: &str) -> Result<FeedDocument, FeedError> {
    serde_json::from_reader(reader).map_err(|e| FeedError::Decode {
        url: url.to_string(),
        source: e,
    })
}
