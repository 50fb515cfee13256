//! Shared world state for release synchronization BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use release_sync::release::{
    adapters::memory::InMemoryTracker,
    domain::{Commit, ProjectKey, TicketKey, TicketMatcher, TransitionConfig},
    services::{ReleaseSyncReport, ReleaseSyncResult, ReleaseSyncService, SyncSettings, VersionOptions},
};
use rstest::fixture;

/// Project identifier the in-memory tracker assigns to the scenario project.
pub const PROJECT_ID: &str = "10000";

/// Scenario world for release synchronization behaviour tests.
pub struct ReleaseWorld {
    pub tracker: InMemoryTracker,
    pub project_key: String,
    pub transitions: TransitionConfig,
    pub dry_run: bool,
    pub commits: Vec<Commit>,
    pub result: Option<ReleaseSyncResult<ReleaseSyncReport>>,
}

impl ReleaseWorld {
    /// Creates a world with an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tracker: InMemoryTracker::new(),
            project_key: String::new(),
            transitions: TransitionConfig::new(),
            dry_run: false,
            commits: Vec::new(),
            result: None,
        }
    }

    /// Builds the service for the configured project and transitions.
    pub fn service(
        &self,
    ) -> Result<ReleaseSyncService<InMemoryTracker, DefaultClock>, eyre::Report> {
        let settings = SyncSettings::new(
            ProjectKey::new(&self.project_key)?,
            TicketMatcher::from_prefixes([self.project_key.as_str()])?,
        )?
        .with_transitions(self.transitions.clone())
        .with_version_options(VersionOptions {
            dry_run: self.dry_run,
            ..VersionOptions::default()
        });
        Ok(ReleaseSyncService::new(
            Arc::new(self.tracker.clone()),
            Arc::new(DefaultClock),
            settings,
        ))
    }

    /// Returns the report of a successful run.
    pub fn report(&self) -> Result<&ReleaseSyncReport, eyre::Report> {
        match self.result.as_ref() {
            Some(Ok(report)) => Ok(report),
            Some(Err(err)) => Err(eyre::eyre!("run failed: {err}")),
            None => Err(eyre::eyre!("release has not been published in this scenario")),
        }
    }
}

impl Default for ReleaseWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ReleaseWorld {
    ReleaseWorld::default()
}

/// Parses a ticket key captured from a step.
pub fn ticket(raw: &str) -> Result<TicketKey, eyre::Report> {
    Ok(TicketKey::new(raw)?)
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
