//! Error types for nvdsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from checkpoint and configuration handling.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The checkpoint file exists but is not a valid `{"Date": ...}` document.
    #[error("failed to parse checkpoint at {path}: {source}")]
    Checkpoint {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Checkpoint serialization failure (write path).
    #[error("checkpoint JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse error on config load, with file path and line context.
    #[error("failed to parse config at {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Convenience constructor for [`CoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
