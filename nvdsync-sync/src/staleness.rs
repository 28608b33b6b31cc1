//! Staleness resolution.
//!
//! Decides which partitions a run fetches:
//! 1. Each incremental partition (`modified`, `recent`) is stale unless the
//!    checkpoint is strictly after its remote last-modified time.
//! 2. If any stale partition's gap exceeds the escalation threshold, the
//!    incremental list is discarded and replaced by one year partition per
//!    year from the origin year through the reference year (full backfill).
//!
//! The reference time is passed in, never read from the clock here.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

use nvdsync_core::{config::UpdateConfig, FeedPartition};
use nvdsync_feed::FeedSource;

use crate::error::SyncError;

/// Tunables for [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    /// Gap beyond which an incremental catch-up is not trusted.
    pub threshold: Duration,
    /// First year of the year-bucketed archives.
    pub origin_year: i32,
}

impl StalenessPolicy {
    pub const DEFAULT_THRESHOLD_DAYS: i64 = 7;
    pub const DEFAULT_ORIGIN_YEAR: i32 = 2002;
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self {
            threshold: Duration::days(Self::DEFAULT_THRESHOLD_DAYS),
            origin_year: Self::DEFAULT_ORIGIN_YEAR,
        }
    }
}

impl From<&UpdateConfig> for StalenessPolicy {
    fn from(config: &UpdateConfig) -> Self {
        Self {
            threshold: Duration::days(config.escalation_days),
            origin_year: config.origin_year,
        }
    }
}

/// Staleness classification of one incremental partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionStatus {
    pub partition: FeedPartition,
    pub remote_modified: DateTime<Utc>,
    pub stale: bool,
    /// `remote_modified - checkpoint`; negative when the partition is current.
    #[serde(serialize_with = "serialize_seconds")]
    pub gap: Duration,
    /// Whether this partition alone would force a full backfill.
    pub escalates: bool,
}

/// Outcome of resolution for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub checkpoint: DateTime<Utc>,
    pub reference_time: DateTime<Utc>,
    pub statuses: Vec<PartitionStatus>,
    pub escalated: bool,
    /// Partitions to fetch, in scheduling order. Empty means nothing to do.
    pub partitions: Vec<FeedPartition>,
}

impl Plan {
    pub fn is_noop(&self) -> bool {
        self.partitions.is_empty()
    }
}

/// Classify one partition: stale iff the checkpoint is not after `remote_modified`.
pub fn assess(
    partition: FeedPartition,
    checkpoint: DateTime<Utc>,
    remote_modified: DateTime<Utc>,
    policy: &StalenessPolicy,
) -> PartitionStatus {
    let stale = checkpoint <= remote_modified;
    let gap = remote_modified.signed_duration_since(checkpoint);
    PartitionStatus {
        partition,
        remote_modified,
        stale,
        gap,
        escalates: stale && gap > policy.threshold,
    }
}

/// One partition per year, `origin_year ..= reference year`.
pub fn backfill_partitions(origin_year: i32, reference_time: DateTime<Utc>) -> Vec<FeedPartition> {
    (origin_year..=reference_time.year())
        .map(FeedPartition::Year)
        .collect()
}

/// Build the plan from already-known remote timestamps.
pub fn plan_from_statuses(
    checkpoint: DateTime<Utc>,
    reference_time: DateTime<Utc>,
    statuses: Vec<PartitionStatus>,
    policy: &StalenessPolicy,
) -> Plan {
    let escalated = statuses.iter().any(|s| s.escalates);
    let partitions = if escalated {
        backfill_partitions(policy.origin_year, reference_time)
    } else {
        statuses
            .iter()
            .filter(|s| s.stale)
            .map(|s| s.partition)
            .collect()
    };
    Plan {
        checkpoint,
        reference_time,
        statuses,
        escalated,
        partitions,
    }
}

/// Query every incremental partition's metadata and decide what to fetch.
///
/// The first metadata failure aborts resolution; no partial plan is returned.
pub async fn resolve<S>(
    source: &S,
    checkpoint: DateTime<Utc>,
    reference_time: DateTime<Utc>,
    policy: &StalenessPolicy,
) -> Result<Plan, SyncError>
where
    S: FeedSource + ?Sized,
{
    let mut statuses = Vec::with_capacity(FeedPartition::INCREMENTAL.len());
    for partition in FeedPartition::INCREMENTAL {
        let remote_modified = source
            .last_modified(partition)
            .await
            .map_err(|source| SyncError::Metadata { partition, source })?;
        let status = assess(partition, checkpoint, remote_modified, policy);
        tracing::debug!(
            "{partition}: remote {remote_modified}, checkpoint {checkpoint}, stale={}, gap={}",
            status.stale,
            format_gap(status.gap)
        );
        statuses.push(status);
    }

    let plan = plan_from_statuses(checkpoint, reference_time, statuses, policy);
    if plan.escalated {
        tracing::info!(
            "local mirror is more than {} behind; scheduling full backfill {}..={}",
            format_gap(policy.threshold),
            policy.origin_year,
            reference_time.year()
        );
    }
    Ok(plan)
}

/// Compact human form of a gap: `45s`, `12m`, `5h`, `9d`, with a leading `-`
/// when negative.
pub fn format_gap(gap: Duration) -> String {
    let seconds = gap.num_seconds();
    let sign = if seconds < 0 { "-" } else { "" };
    let seconds = seconds.unsigned_abs();
    if seconds < 60 {
        return format!("{sign}{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{sign}{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{sign}{}h", seconds / (60 * 60));
    }
    format!("{sign}{}d", seconds / (60 * 60 * 24))
}

fn serialize_seconds<S: serde::Serializer>(gap: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(gap.num_seconds())
}
