pub mod push;
pub mod status;
pub mod update;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use nvdsync_core::{config, Config};

/// Work directory plus the configuration that applies to it.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub work_dir: PathBuf,
    pub config: Config,
}

impl Workspace {
    /// Load `config_path`, or `<work_dir>/nvdsync.yaml` when none is given.
    pub fn load(work_dir: PathBuf, config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => config::config_path_at(&work_dir),
        };
        if config_path.is_some() && !path.exists() {
            anyhow::bail!("config file {} does not exist", path.display());
        }
        let config = config::load(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        Ok(Self { work_dir, config })
    }
}
