//! Issue tracker port consumed by release synchronization services.

use crate::release::domain::{
    NewVersion, ProjectKey, StateId, TicketKey, TransitionOption, VersionId, VersionRecord,
    VersionUpdate,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Result type for issue tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Project metadata returned by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerProject {
    /// Numeric project identifier used by version endpoints.
    pub id: String,
    /// Project key used in issue keys and queries.
    pub key: String,
}

/// Minimal issue data returned by searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    /// Remote issue identifier.
    pub id: String,
    /// Issue key, such as `ABC-12`.
    pub key: String,
}

/// Edit applied to a single issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueEdit {
    /// Adds a comment with the given body.
    AddComment(String),
    /// Adds the version to the issue's fix versions.
    AddFixVersion(VersionId),
}

/// Remote issue tracker contract.
///
/// Implementations hold no state between invocations beyond the client
/// handle; every call reads the tracker's authoritative state.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetches a project by key or identifier.
    async fn project(&self, project: &ProjectKey) -> TrackerResult<TrackerProject>;

    /// Lists every version defined on a project.
    async fn project_versions(&self, project_id: &str) -> TrackerResult<Vec<VersionRecord>>;

    /// Creates a version and returns the stored record.
    async fn create_version(&self, version: &NewVersion) -> TrackerResult<VersionRecord>;

    /// Applies a partial update to a version.
    async fn update_version(
        &self,
        version_id: &VersionId,
        update: &VersionUpdate,
    ) -> TrackerResult<()>;

    /// Runs a JQL search and returns matching issues.
    async fn search_issues(&self, jql: &str) -> TrackerResult<Vec<IssueSummary>>;

    /// Lists the transitions currently available for an issue.
    async fn issue_transitions(&self, issue: &TicketKey) -> TrackerResult<Vec<TransitionOption>>;

    /// Applies a workflow transition to an issue.
    async fn transition_issue(&self, issue: &TicketKey, transition: &StateId)
    -> TrackerResult<()>;

    /// Applies an edit to an issue.
    async fn edit_issue(&self, issue: &TicketKey, edit: &IssueEdit) -> TrackerResult<()>;
}

/// Errors returned by issue tracker adapters.
#[derive(Debug, Clone, Error)]
pub enum TrackerError {
    /// The tracker answered with a non-success status.
    #[error("tracker responded with status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response, or the raw body.
        message: String,
    },

    /// The request never produced a response.
    #[error("tracker transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),

    /// The response body did not have the expected shape.
    #[error("unexpected tracker payload: {0}")]
    Decode(String),
}

impl TrackerError {
    /// Builds a status error.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Returns the remote status code, when the failure carried one.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}
