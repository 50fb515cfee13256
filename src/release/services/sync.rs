//! Release synchronization orchestration.

use super::{
    tickets::{TicketAction, TicketActionRecord, TicketWorkflow},
    versions::{VersionOptions, VersionService},
};
use crate::release::{
    domain::{
        BranchTransition, PreReleasePattern, ProjectKey, ReleaseContext, ReleaseDomainError,
        ReleaseStage, ReleaseTemplates, TemplateError, TicketKey, TicketMatcher, TransitionConfig,
        VersionRecord, validate_transition_config,
    },
    ports::{IssueTracker, TrackerError, TrackerProject},
};
use futures::{StreamExt, future::join_all, stream};
use mockable::Clock;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Default number of simultaneous bounded tracker requests.
pub const DEFAULT_NETWORK_CONCURRENCY: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(limit) => limit,
    None => NonZeroUsize::MIN,
};

/// Default workflow status swept for orphaned tickets on production releases.
pub const DEFAULT_READY_STATUS: &str = "Production ready";

/// Issue types the ready-ticket sweep considers by default.
pub const DEFAULT_READY_ISSUE_TYPES: [&str; 2] = ["Bug", "Task"];

/// Service-level errors that abort a synchronization run.
#[derive(Debug, Error)]
pub enum ReleaseSyncError {
    /// A release template failed to render.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// A tracker read the run depends on failed.
    #[error("failed to read {what} from tracker: {source}")]
    Tracker {
        /// What was being read.
        what: &'static str,
        /// Underlying tracker failure.
        #[source]
        source: TrackerError,
    },

    /// Attaching the fix version failed with a non-tolerated status.
    #[error("failed to attach fix version to {ticket}: {source}")]
    Attach {
        /// Ticket being updated.
        ticket: TicketKey,
        /// Underlying tracker failure.
        #[source]
        source: TrackerError,
    },
}

/// Result type for synchronization runs.
pub type ReleaseSyncResult<T> = Result<T, ReleaseSyncError>;

/// Settings for one synchronization run.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    project: ProjectKey,
    matcher: TicketMatcher,
    transitions: Option<TransitionConfig>,
    templates: ReleaseTemplates,
    pre_release_pattern: PreReleasePattern,
    ready_status: Option<String>,
    ready_issue_types: Vec<String>,
    version_options: VersionOptions,
    network_concurrency: NonZeroUsize,
}

impl SyncSettings {
    /// Creates settings with the default templates, pre-release pattern,
    /// ready status, and concurrency.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseDomainError::InvalidPattern`] if the default
    /// pre-release pattern fails to compile.
    pub fn new(project: ProjectKey, matcher: TicketMatcher) -> Result<Self, ReleaseDomainError> {
        Ok(Self {
            project,
            matcher,
            transitions: None,
            templates: ReleaseTemplates::default(),
            pre_release_pattern: PreReleasePattern::daily()?,
            ready_status: Some(DEFAULT_READY_STATUS.to_owned()),
            ready_issue_types: DEFAULT_READY_ISSUE_TYPES
                .iter()
                .map(|kind| (*kind).to_owned())
                .collect(),
            version_options: VersionOptions::default(),
            network_concurrency: DEFAULT_NETWORK_CONCURRENCY,
        })
    }

    /// Sets the per-branch transition configuration.
    #[must_use]
    pub fn with_transitions(mut self, transitions: TransitionConfig) -> Self {
        self.transitions = Some(transitions);
        self
    }

    /// Sets the version name and description templates.
    #[must_use]
    pub fn with_templates(mut self, templates: ReleaseTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Sets the pre-release naming convention.
    #[must_use]
    pub fn with_pre_release_pattern(mut self, pattern: PreReleasePattern) -> Self {
        self.pre_release_pattern = pattern;
        self
    }

    /// Sets the status swept for orphaned tickets; `None` disables the sweep.
    #[must_use]
    pub fn with_ready_status(mut self, status: Option<String>) -> Self {
        self.ready_status = status;
        self
    }

    /// Restricts the sweep to these issue types; an empty list sweeps every
    /// type.
    #[must_use]
    pub fn with_ready_issue_types<I, S>(mut self, issue_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ready_issue_types = issue_types.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the version creation flags.
    #[must_use]
    pub const fn with_version_options(mut self, options: VersionOptions) -> Self {
        self.version_options = options;
        self
    }

    /// Sets the bounded concurrency limit.
    #[must_use]
    pub const fn with_network_concurrency(mut self, limit: NonZeroUsize) -> Self {
        self.network_concurrency = limit;
        self
    }

    /// Builds the ready-ticket query for `project_key` and `status` using the
    /// configured issue types.
    #[must_use]
    pub fn ready_tickets_query(&self, project_key: &str, status: &str) -> String {
        ready_tickets_query(project_key, status, &self.ready_issue_types)
    }

    /// Returns whether tracker writes are suppressed.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.version_options.dry_run
    }
}

/// Everything a run decided and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseSyncReport {
    /// Tickets referenced by the release commits.
    pub tickets: Vec<TicketKey>,
    /// Comment and move records for the referenced tickets.
    pub ticket_actions: Vec<TicketActionRecord>,
    /// Version resolved for the release, if any.
    pub version: Option<VersionRecord>,
    /// Pre-release versions closed on a production release.
    pub closed_pre_releases: Vec<String>,
    /// Moves applied to ready tickets without a release commit.
    pub swept: Vec<TicketActionRecord>,
    /// Fix version attachment records.
    pub attachments: Vec<TicketActionRecord>,
}

/// Orchestrates ticket transitions and release versioning for one release.
#[derive(Clone)]
pub struct ReleaseSyncService<T, C>
where
    T: IssueTracker,
    C: Clock + Send + Sync,
{
    tracker: Arc<T>,
    versions: VersionService<T, C>,
    workflow: TicketWorkflow<T>,
    settings: SyncSettings,
}

impl<T, C> ReleaseSyncService<T, C>
where
    T: IssueTracker,
    C: Clock + Send + Sync,
{
    /// Creates a synchronization service.
    #[must_use]
    pub fn new(tracker: Arc<T>, clock: Arc<C>, settings: SyncSettings) -> Self {
        let versions = VersionService::new(
            Arc::clone(&tracker),
            clock,
            settings.version_options,
        );
        let workflow = TicketWorkflow::new(Arc::clone(&tracker), settings.dry_run());
        Self {
            tracker,
            versions,
            workflow,
            settings,
        }
    }

    /// Returns the distinct tickets referenced by the release commits.
    #[must_use]
    pub fn extract_tickets(&self, release: &ReleaseContext) -> Vec<TicketKey> {
        self.settings.matcher.extract(release.commits())
    }

    /// Runs the full synchronization for a release.
    ///
    /// A release without ticket references performs no tracker calls.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseSyncError`] when a template fails, a required tracker
    /// read fails, or a fix version attachment fails with a non-tolerated
    /// status.
    pub async fn run(&self, release: &ReleaseContext) -> ReleaseSyncResult<ReleaseSyncReport> {
        let tickets = self.extract_tickets(release);
        let rendered: Vec<&str> = tickets.iter().map(TicketKey::as_str).collect();
        info!(tickets = %rendered.join(", "), branch = release.branch(), "found tickets");

        let mut report = ReleaseSyncReport {
            tickets,
            ..ReleaseSyncReport::default()
        };
        if report.tickets.is_empty() {
            info!("no tickets referenced by this release, nothing to synchronize");
            return Ok(report);
        }

        let entry = self.branch_transition(release.branch());
        report.ticket_actions = self
            .transition_tickets(release, entry, &report.tickets)
            .await;
        self.finalize_release(release, entry, &mut report).await?;
        Ok(report)
    }

    /// Comments on and moves every ticket whose configured target transition
    /// is currently available.
    ///
    /// Tickets are processed concurrently without a cap, and the call
    /// returns only after every ticket's actions have settled. `rule` is the
    /// branch's validated transition rule; `None` skips the stage.
    pub async fn transition_tickets(
        &self,
        release: &ReleaseContext,
        rule: Option<&BranchTransition>,
        tickets: &[TicketKey],
    ) -> Vec<TicketActionRecord> {
        info!(branch = release.branch(), "start ticket transition step");
        let Some(entry) = rule else {
            return Vec::new();
        };
        let Some(target) = entry.target_state.as_ref() else {
            warn!(
                branch = release.branch(),
                "transition config has no targetState, skipping moves and comments"
            );
            return Vec::new();
        };

        let comment_template = entry.comment.as_deref();
        let records = join_all(
            tickets
                .iter()
                .map(|ticket| self.workflow.advance(ticket, target, comment_template)),
        )
        .await
        .into_iter()
        .flatten()
        .collect();
        info!(branch = release.branch(), "end ticket transition step");
        records
    }

    /// Resolves the release version, closes pre-releases and sweeps ready
    /// tickets on production, then attaches the version to every ticket.
    ///
    /// The sweep moves tickets with the target of `entry`, the branch's
    /// validated transition rule.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseSyncError`] when a template fails, the project or its
    /// versions cannot be read, or an attachment fails with a non-tolerated
    /// status.
    pub async fn finalize_release(
        &self,
        release: &ReleaseContext,
        entry: Option<&BranchTransition>,
        report: &mut ReleaseSyncReport,
    ) -> ReleaseSyncResult<()> {
        let stage = release.stage();
        let version_name = self.settings.templates.render_version_name(release)?;
        let description = self.settings.templates.render_description(release)?;
        info!(version = %version_name, "using tracker release");

        let project = self
            .tracker
            .project(&self.settings.project)
            .await
            .map_err(|source| ReleaseSyncError::Tracker {
                what: "project",
                source,
            })?;
        info!(project = %project.key, id = %project.id, "found tracker project");

        report.version = self
            .versions
            .find_or_create(&project.id, &version_name, &description)
            .await
            .map_err(|source| ReleaseSyncError::Tracker {
                what: "project versions",
                source,
            })?;
        let Some(version) = report.version.clone() else {
            warn!(version = %version_name, "no version available, skipping fix version updates");
            return Ok(());
        };

        if stage == Some(ReleaseStage::Production) {
            let closure = self
                .versions
                .close_pre_releases(&project.id, &self.settings.pre_release_pattern)
                .await
                .map_err(|source| ReleaseSyncError::Tracker {
                    what: "project versions",
                    source,
                })?;
            report.closed_pre_releases = closure.closed;
            report.swept = self
                .sweep_ready_tickets(&project, entry, &report.tickets)
                .await;
        }

        report.attachments = self.attach_version(&report.tickets, &version).await?;
        Ok(())
    }

    async fn sweep_ready_tickets(
        &self,
        project: &TrackerProject,
        entry: Option<&BranchTransition>,
        tickets: &[TicketKey],
    ) -> Vec<TicketActionRecord> {
        let Some(status) = self.settings.ready_status.as_deref() else {
            return Vec::new();
        };
        let Some(target) = entry.and_then(|rule| rule.target_state.clone()) else {
            info!(status, "no target transition configured, skipping ready ticket sweep");
            return Vec::new();
        };

        let jql = self.settings.ready_tickets_query(&project.key, status);
        let found = match self.tracker.search_issues(&jql).await {
            Ok(found) => found,
            Err(err) => {
                error!(error = %err, jql = %jql, "ready ticket search failed");
                return Vec::new();
            }
        };

        let released: HashSet<&TicketKey> = tickets.iter().collect();
        let orphans: Vec<TicketKey> = found
            .iter()
            .filter_map(|issue| TicketKey::new(&issue.key).ok())
            .filter(|ticket| !released.contains(ticket))
            .collect();
        info!(count = orphans.len(), status, "sweeping ready tickets without commits");

        let workflow = &self.workflow;
        let target_state = &target;
        stream::iter(orphans)
            .map(|ticket| async move { workflow.move_if_reachable(&ticket, target_state).await })
            .buffered(self.settings.network_concurrency.get())
            .collect()
            .await
    }

    async fn attach_version(
        &self,
        tickets: &[TicketKey],
        version: &VersionRecord,
    ) -> ReleaseSyncResult<Vec<TicketActionRecord>> {
        let workflow = &self.workflow;
        let settled: Vec<_> = stream::iter(tickets.iter().cloned())
            .map(|ticket| async move {
                let outcome = workflow.attach_fix_version(&ticket, version).await;
                (ticket, outcome)
            })
            .buffered(self.settings.network_concurrency.get())
            .collect()
            .await;

        let mut records = Vec::with_capacity(settled.len());
        let mut fatal = None;
        for (ticket, outcome) in settled {
            match outcome {
                Ok(outcome) => records.push(TicketActionRecord::new(
                    ticket,
                    TicketAction::AttachFixVersion,
                    outcome,
                )),
                Err(source) => {
                    error!(ticket = %ticket, error = %source, "fix version update failed");
                    fatal.get_or_insert(ReleaseSyncError::Attach { ticket, source });
                }
            }
        }
        fatal.map_or(Ok(records), Err)
    }

    fn branch_transition(&self, branch: &str) -> Option<&BranchTransition> {
        let Some(transitions) = self.settings.transitions.as_ref() else {
            error!(branch, "transition config does not exist");
            return None;
        };
        if !validate_transition_config(transitions, branch) {
            return None;
        }
        transitions.for_branch(branch).ok()
    }
}

/// Builds the JQL selecting a project's tickets in `status`, limited to
/// `issue_types` unless that list is empty.
#[must_use]
pub fn ready_tickets_query(project_key: &str, status: &str, issue_types: &[String]) -> String {
    let mut clauses = vec![
        format!("project = \"{}\"", escape_jql(project_key)),
        format!("status = \"{}\"", escape_jql(status)),
    ];
    if !issue_types.is_empty() {
        let quoted: Vec<String> = issue_types
            .iter()
            .map(|kind| format!("\"{}\"", escape_jql(kind)))
            .collect();
        clauses.push(format!("type IN ({})", quoted.join(", ")));
    }
    clauses.join(" AND ")
}

fn escape_jql(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
