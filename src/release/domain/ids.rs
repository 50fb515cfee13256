//! Identifier and validated scalar types for the release domain.

use super::ReleaseDomainError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Issue key referenced from a commit message, such as `ABC-12`.
///
/// Keys are trimmed and upper-cased so that `abc-12` and `ABC-12` collapse to
/// the same ticket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TicketKey(String);

impl TicketKey {
    /// Creates a normalized ticket key.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseDomainError::EmptyTicketKey`] when the value is blank.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ReleaseDomainError> {
        let normalized = value.as_ref().trim();
        if normalized.is_empty() {
            return Err(ReleaseDomainError::EmptyTicketKey);
        }
        Ok(Self(normalized.to_uppercase()))
    }

    /// Returns the key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TicketKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TicketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tracker project key or numeric identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectKey(String);

impl ProjectKey {
    /// Creates a validated project key.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseDomainError::EmptyProjectKey`] when the value is blank.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ReleaseDomainError> {
        let normalized = value.as_ref().trim();
        if normalized.is_empty() {
            return Err(ReleaseDomainError::EmptyProjectKey);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remote identifier of a version record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    /// Sentinel identifier used for versions synthesized during dry runs.
    pub const DRY_RUN: &'static str = "dry_run_id";

    /// Creates a validated version identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseDomainError::EmptyVersionId`] when the value is blank.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ReleaseDomainError> {
        let normalized = value.as_ref().trim();
        if normalized.is_empty() {
            return Err(ReleaseDomainError::EmptyVersionId);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the dry-run sentinel identifier.
    #[must_use]
    pub fn dry_run() -> Self {
        Self(Self::DRY_RUN.to_owned())
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a workflow transition, as reported by the tracker.
///
/// Configuration files may spell these as JSON numbers or strings; both
/// deserialize to the same textual identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StateId(String);

impl StateId {
    /// Creates a validated state identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseDomainError::EmptyStateId`] when the value is blank.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ReleaseDomainError> {
        let normalized = value.as_ref().trim();
        if normalized.is_empty() {
            return Err(ReleaseDomainError::EmptyStateId);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStateId {
    Text(String),
    Number(u64),
}

impl<'de> Deserialize<'de> for StateId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = match RawStateId::deserialize(deserializer)? {
            RawStateId::Text(text) => text,
            RawStateId::Number(number) => number.to_string(),
        };
        Self::new(value).map_err(serde::de::Error::custom)
    }
}
