//! Tracker version records and the requests that create or close them.

use super::{ReleaseDomainError, VersionId};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default naming convention for daily pre-release versions of the account
/// service, e.g. `[DAILY] v2.3.0 Account`.
pub const DEFAULT_PRE_RELEASE_PATTERN: &str = r"\[DAILY\].*Account";

/// A release container on the tracker that issues are tagged against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    /// Remote identifier.
    pub id: VersionId,
    /// Display name, unique per project.
    pub name: String,
    /// Optional free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the version has shipped.
    #[serde(default)]
    pub released: bool,
    /// Whether the version is archived.
    #[serde(default)]
    pub archived: bool,
    /// Calendar date the version shipped, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
}

impl VersionRecord {
    /// Builds the placeholder returned when a dry run would create `name`.
    #[must_use]
    pub fn dry_run_placeholder(name: impl Into<String>) -> Self {
        Self {
            id: VersionId::dry_run(),
            name: name.into(),
            description: None,
            released: false,
            archived: false,
            release_date: None,
        }
    }

    /// Returns `true` for unreleased, unarchived versions following the
    /// pre-release naming convention.
    #[must_use]
    pub fn is_open_pre_release(&self, pattern: &PreReleasePattern) -> bool {
        !self.released && !self.archived && pattern.matches(&self.name)
    }
}

/// Request to create a version on a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVersion {
    /// Owning project identifier.
    pub project_id: String,
    /// Version name.
    pub name: String,
    /// Version description.
    pub description: String,
    /// Whether to create the version already released.
    pub released: bool,
    /// Release date to stamp, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
}

/// Partial update applied to an existing version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionUpdate {
    /// New released flag.
    pub released: bool,
    /// New release date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
}

impl VersionUpdate {
    /// Marks a version as released on `date`.
    #[must_use]
    pub const fn mark_released(date: NaiveDate) -> Self {
        Self {
            released: true,
            release_date: Some(date),
        }
    }
}

/// Naming convention that identifies pre-release versions.
#[derive(Debug, Clone)]
pub struct PreReleasePattern(Regex);

impl PreReleasePattern {
    /// Compiles a pre-release naming pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseDomainError::InvalidPattern`] when the pattern does
    /// not compile.
    pub fn new(pattern: &str) -> Result<Self, ReleaseDomainError> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|err| ReleaseDomainError::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: err.to_string(),
            })
    }

    /// Compiles [`DEFAULT_PRE_RELEASE_PATTERN`].
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseDomainError::InvalidPattern`] if the built-in pattern
    /// fails to compile.
    pub fn daily() -> Result<Self, ReleaseDomainError> {
        Self::new(DEFAULT_PRE_RELEASE_PATTERN)
    }

    /// Returns `true` when `name` follows the convention.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.0.is_match(name)
    }
}
