//! Version resolution and pre-release closing.

use crate::release::{
    domain::{NewVersion, PreReleasePattern, VersionRecord, VersionUpdate},
    ports::{IssueTracker, TrackerResult},
};
use futures::future::join_all;
use mockable::Clock;
use std::sync::Arc;
use tracing::{error, info};

/// Flags controlling how versions are created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionOptions {
    /// Suppress every tracker write.
    pub dry_run: bool,
    /// Create versions already marked as released.
    pub released: bool,
    /// Stamp today's date on created versions.
    pub set_release_date: bool,
}

/// Outcome of closing stale pre-release versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreReleaseClosure {
    /// Names of versions marked as released (or that would be, in a dry run).
    pub closed: Vec<String>,
    /// Names of versions whose update failed.
    pub failed: Vec<String>,
}

/// Finds, creates, and closes tracker versions.
#[derive(Clone)]
pub struct VersionService<T, C>
where
    T: IssueTracker,
    C: Clock + Send + Sync,
{
    tracker: Arc<T>,
    clock: Arc<C>,
    options: VersionOptions,
}

impl<T, C> VersionService<T, C>
where
    T: IssueTracker,
    C: Clock + Send + Sync,
{
    /// Creates a new version service.
    #[must_use]
    pub const fn new(tracker: Arc<T>, clock: Arc<C>, options: VersionOptions) -> Self {
        Self {
            tracker,
            clock,
            options,
        }
    }

    /// Returns the version named `name`, creating it when absent.
    ///
    /// Existing versions are returned untouched. In a dry run a placeholder
    /// is returned instead of creating anything. A failed creation is logged
    /// and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::release::ports::TrackerError`] when the project's
    /// versions cannot be listed.
    pub async fn find_or_create(
        &self,
        project_id: &str,
        name: &str,
        description: &str,
    ) -> TrackerResult<Option<VersionRecord>> {
        let remote_versions = self.tracker.project_versions(project_id).await?;
        info!(version = name, "looking for version");
        if let Some(existing) = remote_versions
            .into_iter()
            .find(|version| version.name == name)
        {
            info!(version = name, id = %existing.id, "found existing version");
            return Ok(Some(existing));
        }

        info!(version = name, "no existing version found, creating new");
        if self.options.dry_run {
            info!(version = name, "dry run: making a placeholder version");
            return Ok(Some(VersionRecord::dry_run_placeholder(name)));
        }

        let request = NewVersion {
            project_id: project_id.to_owned(),
            name: name.to_owned(),
            description: description.to_owned(),
            released: self.options.released,
            release_date: self
                .options
                .set_release_date
                .then(|| self.clock.utc().date_naive()),
        };
        info!(version = name, project = project_id, "creating version");
        match self.tracker.create_version(&request).await {
            Ok(created) => {
                info!(version = name, id = %created.id, "made new version");
                Ok(Some(created))
            }
            Err(err) => {
                error!(version = name, error = %err, "error while creating version");
                Ok(None)
            }
        }
    }

    /// Marks every open pre-release version of a project as released.
    ///
    /// Updates run concurrently; one failure does not stop the others.
    ///
    /// # Errors
    ///
    /// Returns [`crate::release::ports::TrackerError`] when the project's
    /// versions cannot be listed.
    pub async fn close_pre_releases(
        &self,
        project_id: &str,
        pattern: &PreReleasePattern,
    ) -> TrackerResult<PreReleaseClosure> {
        let remote_versions = self.tracker.project_versions(project_id).await?;
        let today = self.clock.utc().date_naive();
        let update = VersionUpdate::mark_released(today);

        let closing = remote_versions
            .into_iter()
            .filter(|version| version.is_open_pre_release(pattern))
            .map(|version| async move {
                info!(version = %version.name, "setting pre-release to released");
                if self.options.dry_run {
                    return (version.name, true);
                }
                match self.tracker.update_version(&version.id, &update).await {
                    Ok(()) => (version.name, true),
                    Err(err) => {
                        error!(
                            version = %version.name,
                            error = %err,
                            "error while setting pre-release to released"
                        );
                        (version.name, false)
                    }
                }
            });

        let mut closure = PreReleaseClosure::default();
        for (name, closed) in join_all(closing).await {
            if closed {
                closure.closed.push(name);
            } else {
                closure.failed.push(name);
            }
        }
        Ok(closure)
    }
}
