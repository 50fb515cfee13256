//! Branch-to-transition configuration and its validation rules.

use super::StateId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, info};

/// Transition settings for one release branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchTransition {
    /// Workflow state tickets are expected to be leaving.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_state: Option<StateId>,
    /// Transition to apply to each released ticket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_state: Option<StateId>,
    /// Comment template posted alongside the transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl BranchTransition {
    /// Creates an entry targeting `target_state`.
    #[must_use]
    pub const fn targeting(target_state: StateId) -> Self {
        Self {
            origin_state: None,
            target_state: Some(target_state),
            comment: None,
        }
    }

    /// Sets the comment template.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets the origin state.
    #[must_use]
    pub fn with_origin(mut self, origin_state: StateId) -> Self {
        self.origin_state = Some(origin_state);
        self
    }
}

/// Reasons a branch's transition configuration is unusable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionConfigError {
    /// The branch has no entry.
    #[error("branch config for {0} is missing in transition config")]
    MissingBranch(String),

    /// The entry declares neither an origin nor a target state.
    #[error("either originState or targetState is missing in {0} entry of transition config")]
    MissingStates(String),
}

/// Mapping from branch name to its transition settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionConfig(BTreeMap<String, BranchTransition>);

impl TransitionConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the entry for `branch`.
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>, entry: BranchTransition) -> Self {
        self.0.insert(branch.into(), entry);
        self
    }

    /// Iterates over every configured branch entry.
    pub fn entries(&self) -> impl Iterator<Item = &BranchTransition> {
        self.0.values()
    }

    /// Returns the entry for `branch` when it is well formed.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionConfigError`] when the branch is absent or its
    /// entry declares neither an origin nor a target state.
    pub fn for_branch(&self, branch: &str) -> Result<&BranchTransition, TransitionConfigError> {
        let entry = self
            .0
            .get(branch)
            .ok_or_else(|| TransitionConfigError::MissingBranch(branch.to_owned()))?;
        if entry.origin_state.is_none() && entry.target_state.is_none() {
            return Err(TransitionConfigError::MissingStates(branch.to_owned()));
        }
        Ok(entry)
    }
}

/// Reports whether `config` can drive transitions for `branch`.
///
/// Problems are logged rather than returned so that callers can skip the
/// transition stage without failing the run.
#[must_use]
pub fn validate_transition_config(config: &TransitionConfig, branch: &str) -> bool {
    match config.for_branch(branch) {
        Ok(_) => {
            info!(branch, "transition setup is correct");
            true
        }
        Err(err) => {
            error!(branch, error = %err, "transition config is not valid");
            false
        }
    }
}

/// A workflow move currently available for a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOption {
    /// Transition identifier.
    pub id: StateId,
    /// Display name of the transition.
    pub name: String,
}

impl TransitionOption {
    /// Creates a transition option.
    #[must_use]
    pub fn new(id: StateId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Returns the option whose identifier equals `target`.
#[must_use]
pub fn find_transition<'a>(
    options: &'a [TransitionOption],
    target: &StateId,
) -> Option<&'a TransitionOption> {
    options.iter().find(|option| &option.id == target)
}
