//! Port supplying the commits that make up a release.

use crate::release::domain::Commit;
use std::sync::Arc;
use thiserror::Error;

/// Source of release commits, typically the CI checkout.
pub trait CommitSource {
    /// Returns the commits in `range`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CommitSourceError`] when the commits cannot be read.
    fn commits(&self, range: &str) -> Result<Vec<Commit>, CommitSourceError>;
}

/// Errors returned by commit sources.
#[derive(Debug, Clone, Error)]
pub enum CommitSourceError {
    /// The underlying command could not run.
    #[error("failed to read commits: {0}")]
    Io(Arc<std::io::Error>),

    /// The underlying command ran but reported failure.
    #[error("commit listing failed: {0}")]
    Command(String),
}

impl From<std::io::Error> for CommitSourceError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}
