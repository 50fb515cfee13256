//! In-memory issue tracker with a call journal and failure injection.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::release::{
    domain::{
        NewVersion, ProjectKey, StateId, TicketKey, TransitionOption, VersionId, VersionRecord,
        VersionUpdate, find_transition,
    },
    ports::{IssueEdit, IssueSummary, IssueTracker, TrackerError, TrackerProject, TrackerResult},
};

/// Issue type given to seeded issues.
const DEFAULT_ISSUE_TYPE: &str = "Task";

/// A call received by the in-memory tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerCall {
    /// Project lookup.
    Project(String),
    /// Version listing for a project identifier.
    ProjectVersions(String),
    /// Version creation by name.
    CreateVersion(String),
    /// Version update by identifier.
    UpdateVersion(VersionId),
    /// JQL search.
    SearchIssues(String),
    /// Transition listing for an issue.
    IssueTransitions(TicketKey),
    /// Transition applied to an issue.
    TransitionIssue(TicketKey, StateId),
    /// Edit applied to an issue.
    EditIssue(TicketKey, IssueEdit),
}

impl TrackerCall {
    /// Returns `true` for calls that change tracker state.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(
            self,
            Self::CreateVersion(_)
                | Self::UpdateVersion(_)
                | Self::TransitionIssue(..)
                | Self::EditIssue(..)
        )
    }
}

/// Observable state of one stored issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueSnapshot {
    /// Current workflow status name.
    pub status: String,
    /// Comments added, oldest first.
    pub comments: Vec<String>,
    /// Fix versions attached, oldest first.
    pub fix_versions: Vec<VersionId>,
}

#[derive(Debug, Clone, Default)]
struct StoredIssue {
    id: String,
    issue_type: String,
    snapshot: IssueSnapshot,
    transitions: Vec<TransitionOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FailurePoint {
    CreateVersion,
    UpdateVersion(VersionId),
    Transition(TicketKey),
    Comment(TicketKey),
    AttachFixVersion(TicketKey),
}

#[derive(Debug, Default)]
struct InMemoryTrackerState {
    projects: Vec<TrackerProject>,
    versions: Vec<(String, VersionRecord)>,
    issues: BTreeMap<TicketKey, StoredIssue>,
    failures: HashMap<FailurePoint, TrackerError>,
    journal: Vec<TrackerCall>,
    next_id: u64,
}

impl InMemoryTrackerState {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        (10_000 + self.next_id).to_string()
    }

    fn fail_if_injected(&self, point: &FailurePoint) -> TrackerResult<()> {
        self.failures.get(point).cloned().map_or(Ok(()), Err)
    }

    fn issue_mut(&mut self, issue: &TicketKey) -> TrackerResult<&mut StoredIssue> {
        self.issues
            .get_mut(issue)
            .ok_or_else(|| TrackerError::status(404, format!("Issue {issue} does not exist")))
    }
}

/// Thread-safe in-memory issue tracker.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTracker {
    state: Arc<RwLock<InMemoryTrackerState>>,
}

impl InMemoryTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TrackerResult<RwLockReadGuard<'_, InMemoryTrackerState>> {
        self.state
            .read()
            .map_err(|err| TrackerError::transport(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> TrackerResult<RwLockWriteGuard<'_, InMemoryTrackerState>> {
        self.state
            .write()
            .map_err(|err| TrackerError::transport(std::io::Error::other(err.to_string())))
    }

    fn seed(&self, apply: impl FnOnce(&mut InMemoryTrackerState)) {
        if let Ok(mut state) = self.state.write() {
            apply(&mut state);
        }
    }

    /// Registers a project.
    #[must_use]
    pub fn with_project(self, id: impl Into<String>, key: impl Into<String>) -> Self {
        let project = TrackerProject {
            id: id.into(),
            key: key.into(),
        };
        self.seed(|state| state.projects.push(project));
        self
    }

    /// Registers an existing version on a project.
    #[must_use]
    pub fn with_version(self, project_id: impl Into<String>, version: VersionRecord) -> Self {
        self.seed(|state| state.versions.push((project_id.into(), version)));
        self
    }

    /// Registers an issue in `status` with the transitions it can take.
    ///
    /// Taking a transition moves the issue to the transition's name and
    /// removes that transition from the issue's options.
    #[must_use]
    pub fn with_issue(
        self,
        key: &TicketKey,
        status: impl Into<String>,
        transitions: impl IntoIterator<Item = TransitionOption>,
    ) -> Self {
        self.seed(|state| {
            let id = state.allocate_id();
            state.issues.insert(
                key.clone(),
                StoredIssue {
                    id,
                    issue_type: DEFAULT_ISSUE_TYPE.to_owned(),
                    snapshot: IssueSnapshot {
                        status: status.into(),
                        ..IssueSnapshot::default()
                    },
                    transitions: transitions.into_iter().collect(),
                },
            );
        });
        self
    }

    /// Sets the type of a registered issue; issues default to `Task`.
    #[must_use]
    pub fn with_issue_type(self, key: &TicketKey, issue_type: impl Into<String>) -> Self {
        self.seed(|state| {
            if let Some(issue) = state.issues.get_mut(key) {
                issue.issue_type = issue_type.into();
            }
        });
        self
    }

    /// Makes every version creation fail with `status`.
    #[must_use]
    pub fn failing_version_creation(self, status: u16) -> Self {
        self.inject(FailurePoint::CreateVersion, status)
    }

    /// Makes updates of `version_id` fail with `status`.
    #[must_use]
    pub fn failing_version_update(self, version_id: &VersionId, status: u16) -> Self {
        self.inject(FailurePoint::UpdateVersion(version_id.clone()), status)
    }

    /// Makes transitions of `key` fail with `status`.
    #[must_use]
    pub fn failing_transition(self, key: &TicketKey, status: u16) -> Self {
        self.inject(FailurePoint::Transition(key.clone()), status)
    }

    /// Makes comments on `key` fail with `status`.
    #[must_use]
    pub fn failing_comment(self, key: &TicketKey, status: u16) -> Self {
        self.inject(FailurePoint::Comment(key.clone()), status)
    }

    /// Makes fix version attachment on `key` fail with `status`.
    #[must_use]
    pub fn failing_fix_version(self, key: &TicketKey, status: u16) -> Self {
        self.inject(FailurePoint::AttachFixVersion(key.clone()), status)
    }

    fn inject(self, point: FailurePoint, status: u16) -> Self {
        let error = TrackerError::status(status, "injected failure");
        self.seed(|state| {
            state.failures.insert(point, error);
        });
        self
    }

    /// Returns every call received, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<TrackerCall> {
        self.read()
            .map(|state| state.journal.clone())
            .unwrap_or_default()
    }

    /// Returns the state-changing calls received, in order.
    #[must_use]
    pub fn write_calls(&self) -> Vec<TrackerCall> {
        self.calls()
            .into_iter()
            .filter(TrackerCall::is_write)
            .collect()
    }

    /// Returns a snapshot of an issue.
    #[must_use]
    pub fn issue(&self, key: &TicketKey) -> Option<IssueSnapshot> {
        self.read()
            .ok()
            .and_then(|state| state.issues.get(key).map(|issue| issue.snapshot.clone()))
    }

    /// Returns the versions stored for a project.
    #[must_use]
    pub fn versions(&self, project_id: &str) -> Vec<VersionRecord> {
        self.read()
            .map(|state| {
                state
                    .versions
                    .iter()
                    .filter(|(owner, _)| owner == project_id)
                    .map(|(_, version)| version.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Extracts the quoted value of `field = "value"` from a JQL string.
fn quoted_clause<'a>(jql: &'a str, field: &str) -> Option<&'a str> {
    let marker = format!("{field} = \"");
    let start = jql.find(&marker)? + marker.len();
    let rest = jql.get(start..)?;
    let end = rest.find('"')?;
    rest.get(..end)
}

/// Extracts the quoted values of `field IN ("a", "b")` from a JQL string.
fn quoted_list<'a>(jql: &'a str, field: &str) -> Option<Vec<&'a str>> {
    let marker = format!("{field} IN (");
    let start = jql.find(&marker)? + marker.len();
    let rest = jql.get(start..)?;
    let end = rest.find(')')?;
    let values = rest.get(..end)?;
    Some(
        values
            .split(',')
            .map(|value| value.trim().trim_matches('"'))
            .collect(),
    )
}

#[async_trait]
impl IssueTracker for InMemoryTracker {
    async fn project(&self, project: &ProjectKey) -> TrackerResult<TrackerProject> {
        let mut state = self.write()?;
        state
            .journal
            .push(TrackerCall::Project(project.as_str().to_owned()));
        state
            .projects
            .iter()
            .find(|known| known.key == project.as_str() || known.id == project.as_str())
            .cloned()
            .ok_or_else(|| TrackerError::status(404, format!("No project could be found with key '{project}'")))
    }

    async fn project_versions(&self, project_id: &str) -> TrackerResult<Vec<VersionRecord>> {
        let mut state = self.write()?;
        state
            .journal
            .push(TrackerCall::ProjectVersions(project_id.to_owned()));
        Ok(state
            .versions
            .iter()
            .filter(|(owner, _)| owner == project_id)
            .map(|(_, version)| version.clone())
            .collect())
    }

    async fn create_version(&self, version: &NewVersion) -> TrackerResult<VersionRecord> {
        let mut state = self.write()?;
        state
            .journal
            .push(TrackerCall::CreateVersion(version.name.clone()));
        state.fail_if_injected(&FailurePoint::CreateVersion)?;

        let duplicate = state
            .versions
            .iter()
            .any(|(owner, existing)| owner == &version.project_id && existing.name == version.name);
        if duplicate {
            return Err(TrackerError::status(
                400,
                format!("A version with the name {} already exists", version.name),
            ));
        }

        let raw_id = state.allocate_id();
        let id = VersionId::new(&raw_id).map_err(|err| TrackerError::Decode(err.to_string()))?;
        let record = VersionRecord {
            id,
            name: version.name.clone(),
            description: Some(version.description.clone()),
            released: version.released,
            archived: false,
            release_date: version.release_date,
        };
        state
            .versions
            .push((version.project_id.clone(), record.clone()));
        Ok(record)
    }

    async fn update_version(
        &self,
        version_id: &VersionId,
        update: &VersionUpdate,
    ) -> TrackerResult<()> {
        let mut state = self.write()?;
        state
            .journal
            .push(TrackerCall::UpdateVersion(version_id.clone()));
        state.fail_if_injected(&FailurePoint::UpdateVersion(version_id.clone()))?;

        let (_, record) = state
            .versions
            .iter_mut()
            .find(|(_, record)| &record.id == version_id)
            .ok_or_else(|| TrackerError::status(404, format!("Version {version_id} does not exist")))?;
        record.released = update.released;
        if update.release_date.is_some() {
            record.release_date = update.release_date;
        }
        Ok(())
    }

    async fn search_issues(&self, jql: &str) -> TrackerResult<Vec<IssueSummary>> {
        let mut state = self.write()?;
        state.journal.push(TrackerCall::SearchIssues(jql.to_owned()));

        let project_prefix = quoted_clause(jql, "project").map(|key| format!("{key}-"));
        let status = quoted_clause(jql, "status");
        let issue_types = quoted_list(jql, "type");
        Ok(state
            .issues
            .iter()
            .filter(|(key, _)| {
                project_prefix
                    .as_deref()
                    .is_none_or(|prefix| key.as_str().starts_with(prefix))
            })
            .filter(|(_, issue)| status.is_none_or(|wanted| issue.snapshot.status == wanted))
            .filter(|(_, issue)| {
                issue_types
                    .as_ref()
                    .is_none_or(|wanted| wanted.contains(&issue.issue_type.as_str()))
            })
            .map(|(key, issue)| IssueSummary {
                id: issue.id.clone(),
                key: key.as_str().to_owned(),
            })
            .collect())
    }

    async fn issue_transitions(&self, issue: &TicketKey) -> TrackerResult<Vec<TransitionOption>> {
        let mut state = self.write()?;
        state
            .journal
            .push(TrackerCall::IssueTransitions(issue.clone()));
        Ok(state.issue_mut(issue)?.transitions.clone())
    }

    async fn transition_issue(
        &self,
        issue: &TicketKey,
        transition: &StateId,
    ) -> TrackerResult<()> {
        let mut state = self.write()?;
        state
            .journal
            .push(TrackerCall::TransitionIssue(issue.clone(), transition.clone()));
        state.fail_if_injected(&FailurePoint::Transition(issue.clone()))?;

        let stored = state.issue_mut(issue)?;
        let name = find_transition(&stored.transitions, transition)
            .map(|option| option.name.clone())
            .ok_or_else(|| {
                TrackerError::status(400, format!("Transition id '{transition}' is not valid for this issue"))
            })?;
        stored.snapshot.status = name;
        stored.transitions.retain(|option| &option.id != transition);
        Ok(())
    }

    async fn edit_issue(&self, issue: &TicketKey, edit: &IssueEdit) -> TrackerResult<()> {
        let mut state = self.write()?;
        state
            .journal
            .push(TrackerCall::EditIssue(issue.clone(), edit.clone()));
        let point = match edit {
            IssueEdit::AddComment(_) => FailurePoint::Comment(issue.clone()),
            IssueEdit::AddFixVersion(_) => FailurePoint::AttachFixVersion(issue.clone()),
        };
        state.fail_if_injected(&point)?;

        let stored = state.issue_mut(issue)?;
        match edit {
            IssueEdit::AddComment(body) => stored.snapshot.comments.push(body.clone()),
            IssueEdit::AddFixVersion(version_id) => {
                stored.snapshot.fix_versions.push(version_id.clone());
            }
        }
        Ok(())
    }
}
