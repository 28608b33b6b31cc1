//! In-memory feed source for orchestrator tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use nvdsync_core::FeedPartition;
use nvdsync_feed::{FeedDocument, FeedError, FeedSource};

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn record(id: &str) -> Value {
    json!({
        "cve": {
            "CVE_data_meta": { "ID": id, "ASSIGNER": "cve@mitre.org" },
            "problemtype": { "problemtype_data": [] }
        },
        "lastModifiedDate": "2024-01-01T00:00Z"
    })
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
pub struct FakeSource {
    modified: BTreeMap<FeedPartition, DateTime<Utc>>,
    documents: BTreeMap<FeedPartition, Vec<Value>>,
    failing: BTreeSet<FeedPartition>,
    delay: Option<Duration>,
    delays: BTreeMap<FeedPartition, Duration>,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
    pub meta_calls: AtomicUsize,
    pub fetched: Mutex<Vec<FeedPartition>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both incremental partitions report `when`.
    pub fn modified_at(mut self, when: DateTime<Utc>) -> Self {
        for p in FeedPartition::INCREMENTAL {
            self.modified.insert(p, when);
        }
        self
    }

    pub fn partition_modified_at(mut self, partition: FeedPartition, when: DateTime<Utc>) -> Self {
        self.modified.insert(partition, when);
        self
    }

    pub fn document(mut self, partition: FeedPartition, records: Vec<Value>) -> Self {
        self.documents.insert(partition, records);
        self
    }

    pub fn failing(mut self, partition: FeedPartition) -> Self {
        self.failing.insert(partition);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Overrides the shared delay for one partition.
    pub fn partition_delay(mut self, partition: FeedPartition, delay: Duration) -> Self {
        self.delays.insert(partition, delay);
        self
    }

    pub fn fetched(&self) -> Vec<FeedPartition> {
        let mut fetched = self.fetched.lock().unwrap().clone();
        fetched.sort();
        fetched
    }
}

#[async_trait]
impl FeedSource for FakeSource {
    async fn last_modified(&self, partition: FeedPartition) -> Result<DateTime<Utc>, FeedError> {
        self.meta_calls.fetch_add(1, Ordering::SeqCst);
        self.modified
            .get(&partition)
            .copied()
            .ok_or_else(|| FeedError::Status {
                url: format!("fake://{partition}.meta"),
                status: 404,
            })
    }

    async fn fetch(&self, partition: FeedPartition) -> Result<FeedDocument, FeedError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&partition).copied().or(self.delay) {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(partition);

        if self.failing.contains(&partition) {
            return Err(FeedError::Status {
                url: format!("fake://{partition}.json.gz"),
                status: 500,
            });
        }
        Ok(FeedDocument::new(
            self.documents.get(&partition).cloned().unwrap_or_default(),
        ))
    }
}
