//! Per-ticket workflow actions: transition lookup, move, comment, and fix
//! version attachment.

use crate::release::{
    domain::{StateId, TicketKey, TransitionOption, VersionRecord, find_transition, render_comment},
    ports::{IssueEdit, IssueTracker, TrackerError},
};
use std::sync::Arc;
use tracing::{error, info};

/// Remote status codes tolerated when attaching a fix version.
const TOLERATED_ATTACH_STATUSES: [u16; 2] = [400, 404];

/// Kind of write performed against a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketAction {
    /// Post a comment.
    Comment,
    /// Apply a workflow transition.
    Move,
    /// Add the release version to the fix versions.
    AttachFixVersion,
}

/// What happened to a single ticket action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The tracker accepted the write.
    Applied,
    /// The write was decided but suppressed by dry-run mode.
    Simulated,
    /// The target transition is not currently available for the ticket.
    NotReachable,
    /// The write failed with a status that is tolerated.
    Tolerated {
        /// Remote status code.
        status: u16,
    },
    /// The write failed; the failure was logged and swallowed.
    Failed(String),
}

impl ActionOutcome {
    /// Returns `true` when the policy allowed the action, whether or not the
    /// write went through.
    #[must_use]
    pub const fn was_attempted(&self) -> bool {
        !matches!(self, Self::NotReachable)
    }
}

/// Audit entry for one action on one ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketActionRecord {
    /// Ticket acted upon.
    pub ticket: TicketKey,
    /// Action taken.
    pub action: TicketAction,
    /// Result of the action.
    pub outcome: ActionOutcome,
}

impl TicketActionRecord {
    /// Creates a record.
    #[must_use]
    pub const fn new(ticket: TicketKey, action: TicketAction, outcome: ActionOutcome) -> Self {
        Self {
            ticket,
            action,
            outcome,
        }
    }
}

/// Moves, comments on, and tags tickets, gated on their current workflow
/// options.
#[derive(Clone)]
pub struct TicketWorkflow<T>
where
    T: IssueTracker,
{
    tracker: Arc<T>,
    dry_run: bool,
}

impl<T> TicketWorkflow<T>
where
    T: IssueTracker,
{
    /// Creates a ticket workflow.
    #[must_use]
    pub const fn new(tracker: Arc<T>, dry_run: bool) -> Self {
        Self { tracker, dry_run }
    }

    /// Returns the transition to `target` when the ticket can currently take
    /// it.
    ///
    /// A ticket the tracker cannot read is logged and treated as having no
    /// available transitions.
    pub async fn find_transition(
        &self,
        ticket: &TicketKey,
        target: &StateId,
    ) -> Option<TransitionOption> {
        info!(ticket = %ticket, target = %target, "looking up desired status");
        match self.tracker.issue_transitions(ticket).await {
            Ok(options) => {
                let found = find_transition(&options, target).cloned();
                info!(
                    ticket = %ticket,
                    available = options.len(),
                    found = found.as_ref().map(|option| option.name.as_str()),
                    "resolved transition"
                );
                found
            }
            Err(err) => {
                info!(ticket = %ticket, error = %err, "ticket not found");
                None
            }
        }
    }

    /// Applies the transition without checking availability.
    pub async fn move_ticket(&self, ticket: &TicketKey, target: &StateId) -> ActionOutcome {
        if self.dry_run {
            info!(ticket = %ticket, target = %target, "dry run: faking transition");
            return ActionOutcome::Simulated;
        }
        match self.tracker.transition_issue(ticket, target).await {
            Ok(()) => {
                info!(ticket = %ticket, target = %target, "ticket moved");
                ActionOutcome::Applied
            }
            Err(err) => {
                error!(ticket = %ticket, error = %err, "ticket moving error");
                ActionOutcome::Failed(err.to_string())
            }
        }
    }

    /// Posts a comment without checking availability.
    pub async fn comment_ticket(&self, ticket: &TicketKey, body: &str) -> ActionOutcome {
        if self.dry_run {
            info!(ticket = %ticket, comment = body, "dry run: faking comment");
            return ActionOutcome::Simulated;
        }
        match self
            .tracker
            .edit_issue(ticket, &IssueEdit::AddComment(body.to_owned()))
            .await
        {
            Ok(()) => {
                info!(ticket = %ticket, "ticket commented");
                ActionOutcome::Applied
            }
            Err(err) => {
                error!(ticket = %ticket, error = %err, "ticket comment error");
                ActionOutcome::Failed(err.to_string())
            }
        }
    }

    /// Comments on and moves a ticket when `target` is reachable.
    ///
    /// The comment and the move run concurrently and independently; the
    /// returned records always hold one comment entry and one move entry.
    pub async fn advance(
        &self,
        ticket: &TicketKey,
        target: &StateId,
        comment_template: Option<&str>,
    ) -> [TicketActionRecord; 2] {
        let Some(option) = self.find_transition(ticket, target).await else {
            error!(ticket = %ticket, "ticket is not in the correct status to be commented on");
            error!(ticket = %ticket, "ticket is not in the correct status to be moved forward");
            return [
                TicketActionRecord::new(
                    ticket.clone(),
                    TicketAction::Comment,
                    ActionOutcome::NotReachable,
                ),
                TicketActionRecord::new(
                    ticket.clone(),
                    TicketAction::Move,
                    ActionOutcome::NotReachable,
                ),
            ];
        };

        let comment = async {
            match render_comment(comment_template, &option.name) {
                Ok(body) => self.comment_ticket(ticket, &body).await,
                Err(err) => {
                    error!(ticket = %ticket, error = %err, "ticket comment error");
                    ActionOutcome::Failed(err.to_string())
                }
            }
        };
        let (commented, moved) = tokio::join!(comment, self.move_ticket(ticket, target));
        [
            TicketActionRecord::new(ticket.clone(), TicketAction::Comment, commented),
            TicketActionRecord::new(ticket.clone(), TicketAction::Move, moved),
        ]
    }

    /// Moves a ticket when `target` is reachable, without commenting.
    pub async fn move_if_reachable(&self, ticket: &TicketKey, target: &StateId) -> TicketActionRecord {
        let outcome = if self.find_transition(ticket, target).await.is_some() {
            self.move_ticket(ticket, target).await
        } else {
            error!(ticket = %ticket, "ticket is not in the correct status to be moved forward");
            ActionOutcome::NotReachable
        };
        TicketActionRecord::new(ticket.clone(), TicketAction::Move, outcome)
    }

    /// Adds `version` to the ticket's fix versions.
    ///
    /// # Errors
    ///
    /// Returns the [`TrackerError`] when the write fails with anything other
    /// than a 400 or 404 status.
    pub async fn attach_fix_version(
        &self,
        ticket: &TicketKey,
        version: &VersionRecord,
    ) -> Result<ActionOutcome, TrackerError> {
        info!(ticket = %ticket, version = %version.name, "adding issue to version");
        if self.dry_run {
            return Ok(ActionOutcome::Simulated);
        }
        let edit = IssueEdit::AddFixVersion(version.id.clone());
        match self.tracker.edit_issue(ticket, &edit).await {
            Ok(()) => Ok(ActionOutcome::Applied),
            Err(err) => match err.status_code() {
                Some(status) if TOLERATED_ATTACH_STATUSES.contains(&status) => {
                    error!(ticket = %ticket, status, "unable to update issue");
                    Ok(ActionOutcome::Tolerated { status })
                }
                _ => Err(err),
            },
        }
    }
}
