//! Terminal progress bar for `nvdsync update`.
//!
//! indicatif hides the bar when stderr is not a terminal, so CI logs only
//! carry the tracing lines.

use std::sync::{Arc, Mutex};

use indicatif::{ProgressBar, ProgressStyle};
use nvdsync_sync::{ProgressCallback, UpdateProgress};

/// One bar over the scheduled partitions, created once the total is known.
#[derive(Default)]
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, event: UpdateProgress) {
        let mut bar = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        match event {
            UpdateProgress::FetchStarted { total, concurrency } => {
                let pb = ProgressBar::new(total as u64);
                pb.set_style(Self::bar_style());
                pb.set_prefix("update");
                pb.set_message(format!("{concurrency} at a time"));
                *bar = Some(pb);
            }
            UpdateProgress::PartitionSaved {
                partition, summary, ..
            } => {
                if let Some(pb) = bar.as_ref() {
                    pb.set_message(format!("{partition}: {} written", summary.written));
                    pb.inc(1);
                }
            }
            _ => {}
        }
    }

    pub fn as_callback(self: &Arc<Self>) -> ProgressCallback {
        let reporter = Arc::clone(self);
        Box::new(move |event| reporter.handle(event))
    }

    /// Leave the bar at its last position, whether or not the run succeeded.
    pub fn finish(&self) {
        let bar = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pb) = bar.as_ref() {
            if !pb.is_finished() {
                pb.abandon();
            }
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .expect("Invalid template")
            .progress_chars("█▓░")
    }
}
