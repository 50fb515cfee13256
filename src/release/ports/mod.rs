//! Port contracts for release synchronization.
//!
//! Ports define infrastructure-agnostic interfaces used by release services.

pub mod commits;
pub mod tracker;

pub use commits::{CommitSource, CommitSourceError};
pub use tracker::{
    IssueEdit, IssueSummary, IssueTracker, TrackerError, TrackerProject, TrackerResult,
};
