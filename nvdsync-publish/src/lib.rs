//! # nvdsync-publish
//!
//! Publishes the mirrored record tree and checkpoint to a remote git
//! repository after a successful update.

pub mod error;
pub mod git;

pub use error::PublishError;
pub use git::GitPublisher;

/// What a publish attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The index matched `HEAD`; no commit was made. Existing commits were
    /// still pushed when `HEAD` exists.
    NothingToCommit,
    /// A commit was created and pushed. `changed` counts record paths.
    Pushed { changed: usize },
}

/// Commit-and-push collaborator invoked once per successful run.
pub trait Publisher {
    fn publish(&self) -> Result<PublishOutcome, PublishError>;
}
