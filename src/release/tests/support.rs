//! Shared fixtures for release unit tests.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use mockable::Clock;

use crate::release::domain::{
    BranchTransition, Commit, ReleaseContext, StateId, TicketKey, TransitionConfig,
    TransitionOption, VersionId, VersionRecord,
};

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn release_day() -> Self {
        Self(
            Utc.with_ymd_and_hms(2024, 3, 14, 9, 30, 0)
                .single()
                .expect("valid timestamp"),
        )
    }

    pub fn today(self) -> NaiveDate {
        self.0.date_naive()
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn ticket(raw: &str) -> TicketKey {
    TicketKey::new(raw).expect("valid ticket key")
}

pub fn state(raw: &str) -> StateId {
    StateId::new(raw).expect("valid state id")
}

pub fn version_id(raw: &str) -> VersionId {
    VersionId::new(raw).expect("valid version id")
}

pub fn done_transition() -> TransitionOption {
    TransitionOption::new(state("41"), "Done")
}

pub fn version(id: &str, name: &str) -> VersionRecord {
    VersionRecord {
        id: version_id(id),
        name: name.to_owned(),
        description: None,
        released: false,
        archived: false,
        release_date: None,
    }
}

pub fn release(branch: &str, version: &str, messages: &[&str]) -> ReleaseContext {
    let commits = messages
        .iter()
        .enumerate()
        .map(|(index, message)| Commit::new(format!("c0ffee{index}"), *message));
    ReleaseContext::new(
        branch,
        semver::Version::parse(version).expect("valid semver"),
    )
    .with_commits(commits)
}

pub fn transitions_to_done() -> TransitionConfig {
    TransitionConfig::new()
        .with_branch("master", BranchTransition::targeting(state("41")))
        .with_branch(
            "daily",
            BranchTransition::targeting(state("31")).with_comment("Deployed to {{ new_state }}"),
        )
}
