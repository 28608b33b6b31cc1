//! `nvdsync update`: bring the record tree up to date, then publish.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;

use nvdsync_feed::HttpFeedSource;
use nvdsync_sync::{
    pipeline::display_relative, run_update_with_progress, UpdateOptions, UpdateOutcome,
};

use super::{push, Workspace};
use crate::progress::ProgressReporter;

/// Arguments for `nvdsync update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Download and compare, but write neither records nor the checkpoint.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the commit-and-push step after a successful update.
    #[arg(long)]
    pub no_push: bool,
}

impl UpdateArgs {
    pub async fn run(self, workspace: &Workspace) -> Result<()> {
        let source = HttpFeedSource::from_config(&workspace.config.feed)
            .context("failed to build feed client")?;
        let options = UpdateOptions::from_config(&workspace.work_dir, &workspace.config)
            .with_dry_run(self.dry_run);

        let reporter = Arc::new(ProgressReporter::new());
        let callback = reporter.as_callback();
        let result =
            run_update_with_progress(Arc::new(source), &options, Utc::now(), Some(&callback))
                .await;
        reporter.finish();
        let outcome = result.context("update failed")?;
        print_outcome(&outcome, &options);

        // A no-op still publishes so commits from an earlier failed push go out.
        if self.dry_run || self.no_push {
            tracing::info!("publish skipped");
            return Ok(());
        }
        push::publish(workspace).await
    }
}

fn print_outcome(outcome: &UpdateOutcome, options: &UpdateOptions) {
    let prefix = if options.dry_run { "[dry-run] " } else { "" };
    if outcome.plan.is_noop() {
        println!("{prefix}✓ all partitions current, nothing to do");
        return;
    }

    let mode = if outcome.plan.escalated {
        "full backfill"
    } else {
        "incremental"
    };
    println!(
        "{prefix}✓ {} partition(s) fetched ({mode}) into {}: {} written, {} unchanged, {} skipped",
        outcome.documents.len(),
        display_relative(&options.work_dir, &options.cves_root),
        outcome.records_written(),
        outcome.records_unchanged(),
        outcome.records_skipped(),
    );
    if outcome.checkpoint_advanced {
        println!("  checkpoint → {}", outcome.plan.reference_time.to_rfc3339());
    }
}
