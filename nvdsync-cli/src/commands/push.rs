//! `nvdsync push`: commit and push without fetching.

use anyhow::{Context, Result};
use clap::Args;

use nvdsync_publish::{GitPublisher, PublishOutcome, Publisher};

use super::Workspace;

/// Arguments for `nvdsync push`.
#[derive(Args, Debug)]
pub struct PushArgs {}

impl PushArgs {
    pub async fn run(self, workspace: &Workspace) -> Result<()> {
        publish(workspace).await
    }
}

/// Run the git publisher on a blocking thread and report the result.
pub async fn publish(workspace: &Workspace) -> Result<()> {
    let publisher = GitPublisher::from_config(&workspace.work_dir, &workspace.config);
    let outcome = tokio::task::spawn_blocking(move || publisher.publish())
        .await
        .context("publish task panicked")?
        .context("publish failed")?;

    match outcome {
        PublishOutcome::NothingToCommit => println!("✓ nothing to publish"),
        PublishOutcome::Pushed { changed } => {
            println!(
                "✓ pushed to {} ({changed} record file(s) changed)",
                workspace.config.publish.remote_url
            )
        }
    }
    Ok(())
}
