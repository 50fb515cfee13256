//! Commit source that reads history from the system `git` binary.

use camino::{Utf8Path, Utf8PathBuf};
use std::process::Command;
use tracing::debug;

use crate::release::{
    domain::Commit,
    ports::{CommitSource, CommitSourceError},
};

const FIELD_SEPARATOR: char = '\u{1f}';
const RECORD_SEPARATOR: char = '\u{1e}';
const LOG_FORMAT: &str = "--format=%h%x1f%B%x1e";

/// Reads commits with `git log` from a checkout.
#[derive(Debug, Clone)]
pub struct GitCommitSource {
    repository: Utf8PathBuf,
}

impl GitCommitSource {
    /// Creates a source for the checkout at `repository`.
    #[must_use]
    pub fn new(repository: impl AsRef<Utf8Path>) -> Self {
        Self {
            repository: repository.as_ref().to_path_buf(),
        }
    }
}

impl CommitSource for GitCommitSource {
    fn commits(&self, range: &str) -> Result<Vec<Commit>, CommitSourceError> {
        debug!(repository = %self.repository, range, "reading commits");
        let output = Command::new("git")
            .current_dir(self.repository.as_std_path())
            .args(["log", "--reverse", LOG_FORMAT, range])
            .output()?;

        if !output.status.success() {
            return Err(CommitSourceError::Command(
                String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            ));
        }

        Ok(parse_log(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parses `git log` output produced with [`LOG_FORMAT`].
fn parse_log(output: &str) -> Vec<Commit> {
    output
        .split(RECORD_SEPARATOR)
        .filter_map(|record| {
            let (hash, message) = record.split_once(FIELD_SEPARATOR)?;
            let short_hash = hash.trim();
            if short_hash.is_empty() {
                return None;
            }
            Some(Commit::new(short_hash, message.trim()))
        })
        .collect()
}
