//! Wire shapes exchanged with the Jira REST v2 API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::release::{
    domain::{StateId, TransitionOption, VersionId},
    ports::{IssueEdit, IssueSummary},
};

/// Fields requested from searches; only the key is needed.
const SEARCH_FIELDS: [&str; 1] = ["key"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SearchRequest<'a> {
    pub jql: &'a str,
    pub start_at: usize,
    pub max_results: usize,
    pub fields: [&'static str; 1],
}

impl<'a> SearchRequest<'a> {
    pub(super) const fn page(jql: &'a str, start_at: usize, max_results: usize) -> Self {
        Self {
            jql,
            start_at,
            max_results,
            fields: SEARCH_FIELDS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SearchResponse {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub issues: Vec<IssueSummary>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TransitionsResponse {
    #[serde(default)]
    pub transitions: Vec<TransitionOption>,
}

#[derive(Debug, Serialize)]
pub(super) struct TransitionRequest<'a> {
    pub transition: IdRef<'a>,
}

impl<'a> TransitionRequest<'a> {
    pub(super) fn new(transition: &'a StateId) -> Self {
        Self {
            transition: IdRef {
                id: transition.as_str(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct IdRef<'a> {
    pub id: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct CommentBody<'a> {
    pub body: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct AddOperation<T> {
    pub add: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) enum IssueUpdate<'a> {
    Comment([AddOperation<CommentBody<'a>>; 1]),
    FixVersions([AddOperation<IdRef<'a>>; 1]),
}

#[derive(Debug, Serialize)]
pub(super) struct EditRequest<'a> {
    pub update: IssueUpdate<'a>,
}

impl<'a> EditRequest<'a> {
    pub(super) fn new(edit: &'a IssueEdit) -> Self {
        let update = match edit {
            IssueEdit::AddComment(body) => IssueUpdate::Comment([AddOperation {
                add: CommentBody { body },
            }]),
            IssueEdit::AddFixVersion(version_id) => IssueUpdate::FixVersions([AddOperation {
                add: id_ref(version_id),
            }]),
        };
        Self { update }
    }
}

fn id_ref(version_id: &VersionId) -> IdRef<'_> {
    IdRef {
        id: version_id.as_str(),
    }
}

/// Error payload Jira attaches to non-success responses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ErrorPayload {
    #[serde(default)]
    pub error_messages: Vec<String>,
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

impl ErrorPayload {
    /// Flattens the payload into one message, or `None` when it is empty.
    pub(super) fn summary(&self) -> Option<String> {
        let messages: Vec<String> = self
            .error_messages
            .iter()
            .cloned()
            .chain(
                self.errors
                    .iter()
                    .map(|(field, message)| format!("{field}: {message}")),
            )
            .collect();
        if messages.is_empty() {
            None
        } else {
            Some(messages.join("; "))
        }
    }
}
