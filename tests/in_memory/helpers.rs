//! Shared test helpers for in-memory tracker integration tests.

use mockable::DefaultClock;
use release_sync::release::{
    adapters::memory::{InMemoryTracker, TrackerCall},
    domain::{
        BranchTransition, Commit, ProjectKey, ReleaseContext, StateId, TicketKey, TicketMatcher,
        TransitionConfig, TransitionOption, VersionId, VersionRecord,
    },
    services::{ReleaseSyncService, SyncSettings},
};
use rstest::fixture;
use std::sync::Arc;

/// Identifier of the seeded project.
pub const PROJECT_ID: &str = "10000";

/// Transition identifier leading to the done state.
pub const DONE_TRANSITION: &str = "41";

/// Service type used by the integration tests.
pub type TestService = ReleaseSyncService<InMemoryTracker, DefaultClock>;

/// Parses a ticket key.
///
/// # Errors
///
/// Returns an error if the key is blank.
pub fn ticket(raw: &str) -> eyre::Result<TicketKey> {
    Ok(TicketKey::new(raw)?)
}

/// Provides a tracker seeded with project `ABC`, two tickets under review,
/// one orphaned ready ticket, and an open daily pre-release.
#[fixture]
pub fn tracker() -> InMemoryTracker {
    let done = || {
        StateId::new(DONE_TRANSITION)
            .map(|id| vec![TransitionOption::new(id, "Done")])
            .unwrap_or_default()
    };
    let key = |raw: &str| TicketKey::new(raw).ok();
    let mut tracker = InMemoryTracker::new().with_project(PROJECT_ID, "ABC");
    for (raw, status) in [
        ("ABC-1", "In Review"),
        ("ABC-2", "In Review"),
        ("ABC-7", "Production ready"),
    ] {
        if let Some(issue) = key(raw) {
            tracker = tracker.with_issue(&issue, status, done());
        }
    }
    if let Ok(id) = VersionId::new("601") {
        tracker = tracker.with_version(
            PROJECT_ID,
            VersionRecord {
                id,
                ..VersionRecord::dry_run_placeholder("[DAILY] v2.3.0 Account")
            },
        );
    }
    tracker
}

/// Builds the default settings for project `ABC` with `master` moving
/// tickets to done.
///
/// # Errors
///
/// Returns an error if any domain value fails validation.
pub fn settings() -> eyre::Result<SyncSettings> {
    let transitions = TransitionConfig::new().with_branch(
        "master",
        BranchTransition::targeting(StateId::new(DONE_TRANSITION)?)
            .with_comment("Released as part of {{ new_state }}"),
    );
    Ok(SyncSettings::new(
        ProjectKey::new("ABC")?,
        TicketMatcher::from_prefixes(["ABC"])?,
    )?
    .with_transitions(transitions))
}

/// Builds a service over a shared tracker handle.
#[must_use]
pub fn service(tracker: &InMemoryTracker, settings: SyncSettings) -> TestService {
    ReleaseSyncService::new(Arc::new(tracker.clone()), Arc::new(DefaultClock), settings)
}

/// Builds a release context with one commit per message.
///
/// # Errors
///
/// Returns an error if `version` is not valid semver.
pub fn release(branch: &str, version: &str, messages: &[&str]) -> eyre::Result<ReleaseContext> {
    let commits = messages
        .iter()
        .enumerate()
        .map(|(index, message)| Commit::new(format!("a1b2c3{index}"), *message));
    Ok(ReleaseContext::new(branch, semver::Version::parse(version)?).with_commits(commits))
}

/// Counts journal entries matching `predicate`.
pub fn count_calls(tracker: &InMemoryTracker, predicate: impl Fn(&TrackerCall) -> bool) -> usize {
    tracker.calls().iter().filter(|call| predicate(call)).count()
}
