//! Synchronization checkpoint.
//!
//! Persists a single `{"Date": "<RFC-3339>"}` document in the work directory.
//! A missing file reads as the Unix epoch, so a first run treats every
//! partition as stale. Writes use the `.tmp` + rename pattern, so readers
//! never observe a half-written checkpoint.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};

/// Default checkpoint file name, relative to the work directory.
pub const DEFAULT_CHECKPOINT_FILE: &str = "last_updated.txt";

/// When the local dataset was last fully synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(rename = "Date")]
    pub date: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(date: DateTime<Utc>) -> Self {
        Self { date }
    }

    /// The checkpoint used when none has ever been written.
    pub fn epoch() -> Self {
        Self {
            date: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn is_epoch(&self) -> bool {
        self.date == DateTime::<Utc>::UNIX_EPOCH
    }
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self::epoch()
    }
}

/// `<work_dir>/<file_name>`. Pure, no I/O.
pub fn checkpoint_path_at(work_dir: &Path, file_name: &str) -> PathBuf {
    work_dir.join(file_name)
}

/// Load the checkpoint at `path`.
///
/// Returns [`Checkpoint::epoch`] if the file does not exist.
pub fn load(path: &Path) -> Result<Checkpoint, CoreError> {
    if !path.exists() {
        return Ok(Checkpoint::epoch());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(contents.trim()).map_err(|e| CoreError::Checkpoint {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Save the checkpoint at `path` atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save(path: &Path, checkpoint: &Checkpoint) -> Result<(), CoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }

    let json = serde_json::to_string(checkpoint)?;
    let tmp = tmp_path(path);
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
