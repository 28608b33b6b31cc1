//! `nvdsync status`: staleness of each incremental partition.

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use nvdsync_core::FeedPartition;
use nvdsync_feed::HttpFeedSource;
use nvdsync_sync::{pipeline, staleness::format_gap, PartitionStatus, Plan, UpdateOptions};

use super::Workspace;

/// Arguments for `nvdsync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub async fn run(self, workspace: &Workspace) -> Result<()> {
        let source = HttpFeedSource::from_config(&workspace.config.feed)
            .context("failed to build feed client")?;
        let options = UpdateOptions::from_config(&workspace.work_dir, &workspace.config);
        let plan = pipeline::plan(&source, &options, Utc::now())
            .await
            .context("failed to resolve partition status")?;

        if self.json {
            print_json(&plan)?;
            return Ok(());
        }
        print_table(&plan, &options);
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusJson<'a> {
    checkpoint: String,
    never_synced: bool,
    escalated: bool,
    statuses: &'a [PartitionStatus],
    scheduled: &'a [FeedPartition],
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "partition")]
    partition: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "remote modified")]
    remote_modified: String,
    #[tabled(rename = "behind by")]
    behind: String,
}

fn print_json(plan: &Plan) -> Result<()> {
    let payload = StatusJson {
        checkpoint: plan.checkpoint.to_rfc3339(),
        never_synced: is_never_synced(plan),
        escalated: plan.escalated,
        statuses: &plan.statuses,
        scheduled: &plan.partitions,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(plan: &Plan, options: &UpdateOptions) {
    let stale = plan.statuses.iter().filter(|s| s.stale).count();
    let checkpoint = if is_never_synced(plan) {
        "never".to_string()
    } else {
        plan.checkpoint.to_rfc3339()
    };
    println!(
        "nvdsync v{} | checkpoint {} | {} stale",
        env!("CARGO_PKG_VERSION"),
        checkpoint,
        stale,
    );

    let separator = "■".repeat(60).bright_black().to_string();
    println!("{separator}");
    println!(
        "Indicators: {} CURRENT  {} STALE  {} BACKFILL",
        indicator(false, false),
        indicator(true, false),
        indicator(true, true),
    );
    println!("{separator}");

    let rows: Vec<StatusTableRow> = plan
        .statuses
        .iter()
        .map(|s| StatusTableRow {
            partition: s.partition.to_string(),
            status: format!("{} {}", indicator(s.stale, s.escalates), label(s)),
            remote_modified: s.remote_modified.to_rfc3339(),
            behind: if s.stale {
                format_gap(s.gap)
            } else {
                "-".to_string()
            },
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if plan.escalated {
        println!(
            "Local mirror is more than {} behind; the next update backfills {}..={} ({} partitions).",
            format_gap(options.policy.threshold),
            options.policy.origin_year,
            plan.reference_time.year(),
            plan.partitions.len(),
        );
    }
    if !plan.is_noop() {
        println!(
            "Run 'nvdsync update' to fetch {} partition(s).",
            plan.partitions.len()
        );
    }
}

fn is_never_synced(plan: &Plan) -> bool {
    plan.checkpoint == chrono::DateTime::<Utc>::UNIX_EPOCH
}

fn label(status: &PartitionStatus) -> &'static str {
    match (status.stale, status.escalates) {
        (false, _) => "CURRENT",
        (true, false) => "STALE",
        (true, true) => "BACKFILL",
    }
}

fn indicator(stale: bool, escalates: bool) -> String {
    match (stale, escalates) {
        (false, _) => "■".green().bold().to_string(),
        (true, false) => "■".yellow().bold().to_string(),
        (true, true) => "■".red().bold().to_string(),
    }
}
