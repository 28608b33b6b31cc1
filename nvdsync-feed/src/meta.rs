//! `.meta` companion files.
//!
//! Each partition publishes a small plain-text file of `key:value` lines:
//!
//! ```text
//! lastModifiedDate:2019-08-05T03:01:30-04:00
//! size:29713463
//! zipSize:1540683
//! gzSize:1540547
//! sha256:B3D4D6E3...
//! ```
//!
//! Only `lastModifiedDate` matters for staleness. Keys are split off at the
//! first colon, so the timestamp's own colons survive.

use chrono::{DateTime, Utc};

use crate::error::FeedError;

pub const LAST_MODIFIED_KEY: &str = "lastModifiedDate";

/// Extract `lastModifiedDate` from a `.meta` body.
///
/// A missing key is a [`FeedError::Meta`], never the epoch, so a broken meta
/// file cannot trigger a silent full backfill.
pub fn parse_last_modified(body: &str, url: &str) -> Result<DateTime<Utc>, FeedError> {
    for line in body.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if key.trim() != LAST_MODIFIED_KEY {
            continue;
        }
        let value = value.trim();
        return DateTime::parse_from_rfc3339(value)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| FeedError::Meta {
                url: url.to_string(),
                reason: format!("bad {LAST_MODIFIED_KEY} '{value}': {e}"),
            });
    }
    Err(FeedError::Meta {
        url: url.to_string(),
        reason: format!("no {LAST_MODIFIED_KEY} line"),
    })
}
