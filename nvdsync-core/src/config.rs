//! YAML configuration.
//!
//! Every field has a default, so a missing `nvdsync.yaml` is not an error and
//! a partial file only needs the keys it overrides:
//!
//! ```yaml
//! feed:
//!   base_url: https://nvd.nist.gov/feeds/json/cve/1.1
//! publish:
//!   remote_url: https://github.com/example/nvd-list.git
//!   username: example
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::checkpoint::DEFAULT_CHECKPOINT_FILE;
use crate::error::{io_err, CoreError};

/// Config file looked up in the work directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "nvdsync.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub storage: StorageConfig,
    pub update: UpdateConfig,
    pub publish: PublishConfig,
}

/// Where and how feed partitions are downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    /// Schema version embedded in file names (`nvdcve-<version>-<partition>`).
    pub version: String,
    pub user_agent: String,
    /// Per-request timeout; `None` keeps the transport default.
    pub timeout_secs: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nvd.nist.gov/feeds/json/cve/1.1".to_string(),
            version: "1.1".to_string(),
            user_agent: concat!("nvdsync/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: None,
        }
    }
}

/// Layout of the mirrored tree inside the work directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub cves_dir: String,
    pub checkpoint_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cves_dir: "cves".to_string(),
            checkpoint_file: DEFAULT_CHECKPOINT_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Maximum number of partition downloads in flight.
    pub concurrency: usize,
    /// Gap (in days) beyond which an incremental run becomes a full backfill.
    pub escalation_days: i64,
    /// First year covered by the year-bucketed archives.
    pub origin_year: i32,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            escalation_days: 7,
            origin_year: 2002,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub remote_url: String,
    pub username: String,
    /// Name of the environment variable holding the push token.
    pub token_env: String,
    pub author_name: String,
    pub author_email: String,
    pub commit_message: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            remote_url: "https://github.com/knqyf263/nvd-list.git".to_string(),
            username: "knqyf263".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            author_name: "nvdsync".to_string(),
            author_email: "nvdsync@localhost".to_string(),
            commit_message: "Automatic update".to_string(),
        }
    }
}

/// `<work_dir>/nvdsync.yaml`. Pure, no I/O.
pub fn config_path_at(work_dir: &Path) -> PathBuf {
    work_dir.join(DEFAULT_CONFIG_FILE)
}

/// Load configuration from `path`.
///
/// Returns [`Config::default`] if the file does not exist,
/// `CoreError::Config` (with path + line context) if it is malformed.
pub fn load(path: &Path) -> Result<Config, CoreError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| CoreError::Config {
        path: path.to_path_buf(),
        source: e,
    })
}
