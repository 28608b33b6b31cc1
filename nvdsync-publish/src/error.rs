use std::path::PathBuf;

use thiserror::Error;

/// Error surface for committing and pushing the mirrored tree.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not inside a git work tree")]
    NotARepository { path: PathBuf },

    #[error("git {step} failed ({status}): {stderr}")]
    Git {
        step: &'static str,
        status: String,
        stderr: String,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PublishError {
    PublishError::Io {
        path: path.into(),
        source,
    }
}
