//! Update orchestration shared by the `update` and `status` commands.
//!
//! A run loads the checkpoint, resolves the plan, downloads the scheduled
//! partitions with bounded concurrency and writes each document as it
//! arrives. The checkpoint only moves forward after every scheduled
//! partition has been written.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use nvdsync_core::{checkpoint, Checkpoint, Config, FeedPartition};
use nvdsync_feed::{FeedDocument, FeedSource};

use crate::error::SyncError;
use crate::progress::{emit, ProgressCallback, UpdateProgress};
use crate::staleness::{self, Plan, StalenessPolicy};
use crate::writer::{save_document, DocumentSummary};

/// Default bound on in-flight partition downloads.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Everything a run needs besides the feed source and the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOptions {
    pub work_dir: PathBuf,
    /// Root of the mirrored record tree.
    pub cves_root: PathBuf,
    pub checkpoint_path: PathBuf,
    pub concurrency: usize,
    pub policy: StalenessPolicy,
    /// Fetch and compare but write nothing, including the checkpoint.
    pub dry_run: bool,
}

impl UpdateOptions {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self::from_config(work_dir, &Config::default())
    }

    /// Resolve storage paths from `config` relative to `work_dir`.
    pub fn from_config(work_dir: impl Into<PathBuf>, config: &Config) -> Self {
        let work_dir = work_dir.into();
        Self {
            cves_root: work_dir.join(&config.storage.cves_dir),
            checkpoint_path: checkpoint::checkpoint_path_at(
                &work_dir,
                &config.storage.checkpoint_file,
            ),
            concurrency: config.update.concurrency,
            policy: StalenessPolicy::from(&config.update),
            dry_run: false,
            work_dir,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub plan: Plan,
    /// One entry per scheduled partition, in completion order.
    pub documents: Vec<DocumentSummary>,
    /// Whether the checkpoint file was rewritten by this run.
    pub checkpoint_advanced: bool,
}

impl UpdateOutcome {
    pub fn records_written(&self) -> usize {
        self.documents.iter().map(|d| d.written).sum()
    }

    pub fn records_unchanged(&self) -> usize {
        self.documents.iter().map(|d| d.unchanged).sum()
    }

    pub fn records_skipped(&self) -> usize {
        self.documents.iter().map(|d| d.skipped).sum()
    }
}

/// Load the checkpoint and resolve what a run at `now` would fetch.
pub async fn plan<S>(
    source: &S,
    options: &UpdateOptions,
    now: DateTime<Utc>,
) -> Result<Plan, SyncError>
where
    S: FeedSource + ?Sized,
{
    let current = checkpoint::load(&options.checkpoint_path)?;
    if current.is_epoch() {
        tracing::info!(
            "no checkpoint at {}; treating every partition as stale",
            options.checkpoint_path.display()
        );
    }
    staleness::resolve(source, current.date, now, &options.policy).await
}

/// Run one update at `now`.
///
/// Any metadata, fetch or write failure aborts the run and leaves the
/// checkpoint untouched. Records already written stay on disk.
pub async fn run_update<S>(
    source: Arc<S>,
    options: &UpdateOptions,
    now: DateTime<Utc>,
) -> Result<UpdateOutcome, SyncError>
where
    S: FeedSource + ?Sized + 'static,
{
    run_update_with_progress(source, options, now, None).await
}

/// [`run_update`] reporting each saved partition to `on_progress`.
pub async fn run_update_with_progress<S>(
    source: Arc<S>,
    options: &UpdateOptions,
    now: DateTime<Utc>,
    on_progress: Option<&ProgressCallback>,
) -> Result<UpdateOutcome, SyncError>
where
    S: FeedSource + ?Sized + 'static,
{
    let plan = plan(source.as_ref(), options, now).await?;

    if plan.is_noop() {
        tracing::info!("all partitions are current; nothing to fetch");
        return Ok(UpdateOutcome {
            plan,
            documents: Vec::new(),
            checkpoint_advanced: false,
        });
    }

    tracing::info!(
        "fetching {} partition(s), at most {} at a time",
        plan.partitions.len(),
        options.concurrency.max(1)
    );
    let documents = fetch_and_save(source, &plan.partitions, options, on_progress).await?;

    let checkpoint_advanced = if options.dry_run {
        tracing::info!("[dry-run] checkpoint left at {}", plan.checkpoint);
        false
    } else {
        checkpoint::save(&options.checkpoint_path, &Checkpoint::new(now))?;
        tracing::info!("checkpoint advanced to {now}");
        true
    };

    Ok(UpdateOutcome {
        plan,
        documents,
        checkpoint_advanced,
    })
}

/// Aborts every still-running fetch when the run ends early.
struct AbortOnDrop(Vec<JoinHandle<()>>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

async fn fetch_and_save<S>(
    source: Arc<S>,
    partitions: &[FeedPartition],
    options: &UpdateOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<Vec<DocumentSummary>, SyncError>
where
    S: FeedSource + ?Sized + 'static,
{
    let total = partitions.len();
    let concurrency = options.concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<(FeedPartition, FeedDocument)>();
    let (error_tx, mut error_rx) = mpsc::unbounded_channel::<SyncError>();

    let mut workers = AbortOnDrop(Vec::with_capacity(total));
    for &partition in partitions {
        let source = Arc::clone(&source);
        let semaphore = Arc::clone(&semaphore);
        let result_tx = result_tx.clone();
        let error_tx = error_tx.clone();
        workers.0.push(tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            match source.fetch(partition).await {
                Ok(document) => {
                    let _ = result_tx.send((partition, document));
                }
                Err(source) => {
                    let _ = error_tx.send(SyncError::Fetch { partition, source });
                }
            }
        }));
    }
    drop(result_tx);
    drop(error_tx);
    emit(on_progress, UpdateProgress::FetchStarted { total, concurrency });

    let mut summaries = Vec::with_capacity(total);
    for done in 1..=total {
        tokio::select! {
            biased;
            Some(err) = error_rx.recv() => return Err(err),
            Some((partition, document)) = result_rx.recv() => {
                let summary = save_document(
                    &options.cves_root,
                    Some(partition),
                    &document,
                    options.dry_run,
                )?;
                tracing::info!(
                    "[{done}/{total}] {partition}: {} record(s), {} written, {} unchanged, {} skipped",
                    summary.records,
                    summary.written,
                    summary.unchanged,
                    summary.skipped
                );
                emit(
                    on_progress,
                    UpdateProgress::PartitionSaved {
                        partition,
                        done,
                        total,
                        summary: summary.clone(),
                    },
                );
                summaries.push(summary);
            }
            else => return Err(SyncError::WorkerLost { remaining: total + 1 - done }),
        }
    }
    Ok(summaries)
}

/// `<work_dir>` relative display helper for log lines and CLI output.
pub fn display_relative<'a>(work_dir: &Path, path: &'a Path) -> std::borrow::Cow<'a, str> {
    match path.strip_prefix(work_dir) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy(),
        _ => path.to_string_lossy(),
    }
}
