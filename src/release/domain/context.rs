//! Per-invocation release context supplied by the CI environment.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Branch that publishes production releases.
const PRODUCTION_BRANCH: &str = "master";

/// Branch that publishes daily pre-releases.
const DAILY_BRANCH: &str = "daily";

/// A commit included in the release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    short_hash: String,
    message: String,
}

impl Commit {
    /// Creates a commit from its abbreviated hash and full message.
    #[must_use]
    pub fn new(short_hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            short_hash: short_hash.into(),
            message: message.into(),
        }
    }

    /// Returns the abbreviated commit hash.
    #[must_use]
    pub fn short_hash(&self) -> &str {
        &self.short_hash
    }

    /// Returns the full commit message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Release pipeline stage derived from the target branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseStage {
    /// Release cut from the production branch.
    Production,
    /// Pre-release cut from the daily branch.
    Daily,
}

impl ReleaseStage {
    /// Derives the stage from a branch name.
    ///
    /// Returns `None` for branches that do not map to a stage.
    #[must_use]
    pub fn from_branch(branch: &str) -> Option<Self> {
        match branch {
            PRODUCTION_BRANCH => Some(Self::Production),
            DAILY_BRANCH => Some(Self::Daily),
            _ => None,
        }
    }

    /// Returns the label exposed to release templates.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "PRODUCTION",
            Self::Daily => "DAILY",
        }
    }
}

impl fmt::Display for ReleaseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of the release being published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseContext {
    commits: Vec<Commit>,
    branch: String,
    version: Version,
    notes: String,
}

impl ReleaseContext {
    /// Creates a context for the next release on `branch`.
    #[must_use]
    pub fn new(branch: impl Into<String>, version: Version) -> Self {
        Self {
            commits: Vec::new(),
            branch: branch.into(),
            version,
            notes: String::new(),
        }
    }

    /// Sets the commits included in the release.
    #[must_use]
    pub fn with_commits(mut self, commits: impl IntoIterator<Item = Commit>) -> Self {
        self.commits = commits.into_iter().collect();
        self
    }

    /// Sets the generated release notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Returns the commits in pipeline order.
    #[must_use]
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    /// Returns the target branch name.
    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Returns the next release version.
    #[must_use]
    pub const fn version(&self) -> &Version {
        &self.version
    }

    /// Returns the release notes.
    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Returns the stage derived from the branch.
    #[must_use]
    pub fn stage(&self) -> Option<ReleaseStage> {
        ReleaseStage::from_branch(&self.branch)
    }
}
