//! Domain types shared by the feed, sync and publish crates.
//!
//! Feed partitions render to the exact tokens the upstream URLs use
//! (`modified`, `recent`, `2002`, ...). Record identifiers are parsed once
//! and carry the pieces the writer needs to lay out the record tree.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Feed partitions
// ---------------------------------------------------------------------------

/// An independently fetchable slice of the remote dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum FeedPartition {
    /// Rolling window of recently modified records.
    Modified,
    /// Rolling window of recently added records.
    Recent,
    /// Full archive for one publication year.
    Year(i32),
}

impl FeedPartition {
    /// The partitions checked on every run before any escalation.
    pub const INCREMENTAL: [FeedPartition; 2] = [FeedPartition::Modified, FeedPartition::Recent];

    pub fn is_incremental(&self) -> bool {
        matches!(self, FeedPartition::Modified | FeedPartition::Recent)
    }
}

impl fmt::Display for FeedPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedPartition::Modified => write!(f, "modified"),
            FeedPartition::Recent => write!(f, "recent"),
            FeedPartition::Year(year) => write!(f, "{year:04}"),
        }
    }
}

/// Error returned when a string does not name a feed partition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown feed partition '{0}'; expected modified, recent or a 4-digit year")]
pub struct PartitionParseError(pub String);

impl FromStr for FeedPartition {
    type Err = PartitionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "modified" => Ok(FeedPartition::Modified),
            "recent" => Ok(FeedPartition::Recent),
            year if year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()) => year
                .parse()
                .map(FeedPartition::Year)
                .map_err(|_| PartitionParseError(s.to_owned())),
            other => Err(PartitionParseError(other.to_owned())),
        }
    }
}

impl From<FeedPartition> for String {
    fn from(p: FeedPartition) -> Self {
        p.to_string()
    }
}

impl TryFrom<String> for FeedPartition {
    type Error = PartitionParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ---------------------------------------------------------------------------
// Record identifiers
// ---------------------------------------------------------------------------

/// Why a string was rejected as a record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordIdError {
    #[error("identifier '{id}' has {found} dash-separated components, expected 3")]
    ComponentCount { id: String, found: usize },

    #[error("identifier '{id}' has an unusable component '{component}'")]
    BadComponent { id: String, component: String },
}

/// A parsed `PREFIX-YEAR-SEQUENCE` identifier such as `CVE-2023-1234`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId {
    raw: String,
    year_start: usize,
    year_end: usize,
}

impl RecordId {
    pub fn parse(raw: &str) -> Result<Self, RecordIdError> {
        let parts: Vec<&str> = raw.split('-').collect();
        if parts.len() != 3 {
            return Err(RecordIdError::ComponentCount {
                id: raw.to_owned(),
                found: parts.len(),
            });
        }
        // Components become path segments, so they must stay inside the tree.
        for component in &parts {
            if component.is_empty()
                || *component == "."
                || *component == ".."
                || component.contains(['/', '\\'])
            {
                return Err(RecordIdError::BadComponent {
                    id: raw.to_owned(),
                    component: (*component).to_owned(),
                });
            }
        }
        let year_start = parts[0].len() + 1;
        Ok(Self {
            raw: raw.to_owned(),
            year_start,
            year_end: year_start + parts[1].len(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn prefix(&self) -> &str {
        &self.raw[..self.year_start - 1]
    }

    /// The year segment, used as the record's directory name.
    pub fn year(&self) -> &str {
        &self.raw[self.year_start..self.year_end]
    }

    pub fn sequence(&self) -> &str {
        &self.raw[self.year_end + 1..]
    }

    /// `<ID>.json`
    pub fn file_name(&self) -> String {
        format!("{}.json", self.raw)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.raw.fmt(f)
    }
}

impl FromStr for RecordId {
    type Err = RecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
