//! reqwest-backed Jira client implementing [`IssueTracker`].

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::models::{
    EditRequest, ErrorPayload, SearchRequest, SearchResponse, TransitionRequest,
    TransitionsResponse,
};
use crate::release::{
    domain::{
        NewVersion, ProjectKey, StateId, TicketKey, TransitionOption, VersionId, VersionRecord,
        VersionUpdate,
    },
    ports::{IssueEdit, IssueSummary, IssueTracker, TrackerError, TrackerProject, TrackerResult},
};

const API_PREFIX: &str = "rest/api/2/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SEARCH_PAGE_SIZE: usize = 100;

/// Basic-auth credentials for the Jira API.
#[derive(Clone, PartialEq, Eq)]
pub struct JiraCredentials {
    encoded: String,
}

impl JiraCredentials {
    /// Wraps an already base64-encoded `user:token` pair.
    ///
    /// # Errors
    ///
    /// Returns [`JiraClientError::InvalidCredentials`] when the value is blank
    /// or not valid base64.
    pub fn from_encoded(encoded: impl AsRef<str>) -> Result<Self, JiraClientError> {
        let trimmed = encoded.as_ref().trim();
        if trimmed.is_empty() || STANDARD.decode(trimmed).is_err() {
            return Err(JiraClientError::InvalidCredentials);
        }
        Ok(Self {
            encoded: trimmed.to_owned(),
        })
    }

    /// Encodes an account email and API token.
    ///
    /// # Errors
    ///
    /// Returns [`JiraClientError::InvalidCredentials`] when either part is blank.
    pub fn from_email_token(email: &str, token: &str) -> Result<Self, JiraClientError> {
        if email.trim().is_empty() || token.trim().is_empty() {
            return Err(JiraClientError::InvalidCredentials);
        }
        Ok(Self {
            encoded: STANDARD.encode(format!("{}:{}", email.trim(), token.trim())),
        })
    }

    fn header_value(&self) -> Result<HeaderValue, JiraClientError> {
        let mut value = HeaderValue::from_str(&format!("Basic {}", self.encoded))
            .map_err(|_| JiraClientError::InvalidCredentials)?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for JiraCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraCredentials")
            .field("encoded", &"<redacted>")
            .finish()
    }
}

/// Errors raised while constructing a [`JiraTracker`].
#[derive(Debug, Error)]
pub enum JiraClientError {
    /// The host is not an absolute URL.
    #[error("invalid Jira host '{host}': {reason}")]
    InvalidHost {
        /// Host as supplied.
        host: String,
        /// Parser message.
        reason: String,
    },

    /// The credentials cannot be used as an authorization header.
    #[error("invalid Jira credentials")]
    InvalidCredentials,

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Issue tracker backed by the Jira REST v2 API.
#[derive(Debug, Clone)]
pub struct JiraTracker {
    client: Client,
    base_url: Url,
}

impl JiraTracker {
    /// Creates a client for the Jira instance at `host`.
    ///
    /// `host` may be a bare hostname, in which case `https` is assumed.
    ///
    /// # Errors
    ///
    /// Returns [`JiraClientError`] when the host or credentials are unusable
    /// or the HTTP client cannot be built.
    pub fn new(host: &str, credentials: &JiraCredentials) -> Result<Self, JiraClientError> {
        let base_url = parse_base_url(host)?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, credentials.header_value()?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, base_url })
    }

    fn request(&self, method: Method, path: &str) -> TrackerResult<RequestBuilder> {
        let url = self
            .base_url
            .join(API_PREFIX)
            .and_then(|api| api.join(path))
            .map_err(TrackerError::transport)?;
        debug!(%method, %url, "jira request");
        Ok(self.client.request(method, url))
    }

    async fn send(request: RequestBuilder) -> TrackerResult<Response> {
        let response = request.send().await.map_err(TrackerError::transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorPayload>(&body)
            .ok()
            .and_then(|payload| payload.summary())
            .unwrap_or(body);
        Err(TrackerError::status(status.as_u16(), message))
    }

    async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> TrackerResult<T> {
        let response = Self::send(request).await?;
        response.json::<T>().await.map_err(|err| {
            if err.is_decode() {
                TrackerError::Decode(err.to_string())
            } else {
                TrackerError::transport(err)
            }
        })
    }
}

fn parse_base_url(host: &str) -> Result<Url, JiraClientError> {
    let trimmed = host.trim().trim_end_matches('/');
    let with_scheme = if trimmed.contains("://") {
        format!("{trimmed}/")
    } else {
        format!("https://{trimmed}/")
    };
    Url::parse(&with_scheme).map_err(|err| JiraClientError::InvalidHost {
        host: host.to_owned(),
        reason: err.to_string(),
    })
}

#[async_trait]
impl IssueTracker for JiraTracker {
    async fn project(&self, project: &ProjectKey) -> TrackerResult<TrackerProject> {
        let request = self.request(Method::GET, &format!("project/{project}"))?;
        Self::fetch(request).await
    }

    async fn project_versions(&self, project_id: &str) -> TrackerResult<Vec<VersionRecord>> {
        let request = self.request(Method::GET, &format!("project/{project_id}/versions"))?;
        Self::fetch(request).await
    }

    async fn create_version(&self, version: &NewVersion) -> TrackerResult<VersionRecord> {
        let request = self.request(Method::POST, "version")?.json(version);
        Self::fetch(request).await
    }

    async fn update_version(
        &self,
        version_id: &VersionId,
        update: &VersionUpdate,
    ) -> TrackerResult<()> {
        let request = self
            .request(Method::PUT, &format!("version/{version_id}"))?
            .json(update);
        Self::send(request).await.map(drop)
    }

    async fn search_issues(&self, jql: &str) -> TrackerResult<Vec<IssueSummary>> {
        let mut issues = Vec::new();
        loop {
            let page = SearchRequest::page(jql, issues.len(), SEARCH_PAGE_SIZE);
            let request = self.request(Method::POST, "search")?.json(&page);
            let response: SearchResponse = Self::fetch(request).await?;
            let received = response.issues.len();
            issues.extend(response.issues);
            if received == 0 || issues.len() >= response.total {
                return Ok(issues);
            }
        }
    }

    async fn issue_transitions(&self, issue: &TicketKey) -> TrackerResult<Vec<TransitionOption>> {
        let request = self.request(Method::GET, &format!("issue/{issue}/transitions"))?;
        let response: TransitionsResponse = Self::fetch(request).await?;
        Ok(response.transitions)
    }

    async fn transition_issue(
        &self,
        issue: &TicketKey,
        transition: &StateId,
    ) -> TrackerResult<()> {
        let request = self
            .request(Method::POST, &format!("issue/{issue}/transitions"))?
            .json(&TransitionRequest::new(transition));
        Self::send(request).await.map(drop)
    }

    async fn edit_issue(&self, issue: &TicketKey, edit: &IssueEdit) -> TrackerResult<()> {
        let request = self
            .request(Method::PUT, &format!("issue/{issue}"))?
            .json(&EditRequest::new(edit));
        Self::send(request).await.map(drop)
    }
}
