//! Loading and validating release synchronization configuration.
//!
//! Configuration is a JSON document with camelCase keys:
//!
//! ```json
//! {
//!   "projectId": "ABC",
//!   "jiraHost": "acme.atlassian.net",
//!   "ticketPrefixes": ["ABC"],
//!   "jiraTransitions": {
//!     "master": { "targetState": 41, "comment": "Released to {{ new_state }}." }
//!   },
//!   "networkConcurrency": 5
//! }
//! ```
//!
//! Credentials never live in the file; they are read from `JIRA_AUTH`
//! (base64 `user:token`) or from `JIRA_EMAIL` and `JIRA_TOKEN`.

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::Deserialize;
use std::num::NonZeroUsize;
use thiserror::Error;

use crate::release::{
    adapters::jira::{JiraClientError, JiraCredentials},
    domain::{
        DEFAULT_PRE_RELEASE_PATTERN, PreReleasePattern, ProjectKey, ReleaseDomainError,
        ReleaseTemplates, TemplateError, TicketMatcher, TransitionConfig,
        validate_comment_template,
    },
    services::{DEFAULT_NETWORK_CONCURRENCY, DEFAULT_READY_STATUS, SyncSettings, VersionOptions},
};

/// Environment variable holding base64-encoded `user:token` credentials.
pub const JIRA_AUTH_ENV: &str = "JIRA_AUTH";
/// Environment variable holding the account email.
pub const JIRA_EMAIL_ENV: &str = "JIRA_EMAIL";
/// Environment variable holding the API token.
pub const JIRA_TOKEN_ENV: &str = "JIRA_TOKEN";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path as supplied.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON of the expected shape.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path as supplied.
        path: String,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// A configured value failed domain validation.
    #[error(transparent)]
    Domain(#[from] ReleaseDomainError),

    /// A configured template does not parse.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The tracker host is not configured.
    #[error("jiraHost must be configured")]
    MissingHost,

    /// No credentials were found in the environment.
    #[error("set {JIRA_AUTH_ENV}, or both {JIRA_EMAIL_ENV} and {JIRA_TOKEN_ENV}")]
    MissingCredentials,

    /// The credentials are present but unusable.
    #[error(transparent)]
    Credentials(#[from] JiraClientError),
}

/// Release synchronization configuration as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Tracker project key or identifier.
    pub project_id: String,
    /// Tracker base URL or hostname.
    #[serde(default)]
    pub jira_host: Option<String>,
    /// Ticket key prefixes, such as `ABC`.
    #[serde(default)]
    pub ticket_prefixes: Option<Vec<String>>,
    /// Explicit ticket pattern; takes precedence over the prefixes.
    #[serde(default)]
    pub ticket_regex: Option<String>,
    /// Per-branch transition rules.
    #[serde(default)]
    pub jira_transitions: Option<TransitionConfig>,
    /// Template for version names.
    #[serde(default)]
    pub release_name_template: Option<String>,
    /// Template for version descriptions.
    #[serde(default)]
    pub release_description_template: Option<String>,
    /// Suppress every tracker write.
    #[serde(default)]
    pub dry_run: bool,
    /// Create versions already released.
    #[serde(default)]
    pub released: bool,
    /// Stamp today's date on created versions.
    #[serde(default)]
    pub set_release_date: bool,
    /// Bounded concurrency for bulk tracker writes.
    #[serde(default)]
    pub network_concurrency: Option<usize>,
    /// Status swept on production releases; an empty string disables it.
    #[serde(default)]
    pub ready_status: Option<String>,
    /// Issue types the sweep considers; an empty list sweeps every type.
    #[serde(default)]
    pub ready_issue_types: Option<Vec<String>>,
    /// Pattern naming daily pre-release versions.
    #[serde(default)]
    pub pre_release_pattern: Option<String>,
}

impl SyncConfig {
    /// Reads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`] when the file
    /// cannot be read or decoded.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = read_text_file(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Validates the configuration and converts it into run settings.
    ///
    /// Every pattern and template is compiled here so that misconfiguration
    /// surfaces before any tracker call.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a key is missing, a pattern does not
    /// compile, a template does not parse, or the concurrency is zero.
    pub fn to_settings(&self) -> Result<SyncSettings, ConfigError> {
        let project = ProjectKey::new(&self.project_id)?;
        let matcher = self.ticket_matcher()?;

        let templates = self.templates();
        templates.validate()?;

        let network_concurrency = match self.network_concurrency {
            None => DEFAULT_NETWORK_CONCURRENCY,
            Some(limit) => NonZeroUsize::new(limit).ok_or(ReleaseDomainError::ZeroConcurrency)?,
        };

        let pre_release_pattern = PreReleasePattern::new(
            self.pre_release_pattern
                .as_deref()
                .unwrap_or(DEFAULT_PRE_RELEASE_PATTERN),
        )?;

        let ready_status = match self.ready_status.as_deref().map(str::trim) {
            None => Some(DEFAULT_READY_STATUS.to_owned()),
            Some("") => None,
            Some(status) => Some(status.to_owned()),
        };

        let mut settings = SyncSettings::new(project, matcher)?
            .with_templates(templates)
            .with_pre_release_pattern(pre_release_pattern)
            .with_ready_status(ready_status)
            .with_network_concurrency(network_concurrency)
            .with_version_options(VersionOptions {
                dry_run: self.dry_run,
                released: self.released,
                set_release_date: self.set_release_date,
            });

        if let Some(issue_types) = &self.ready_issue_types {
            settings = settings.with_ready_issue_types(
                issue_types
                    .iter()
                    .map(|kind| kind.as_str().trim())
                    .filter(|kind| !kind.is_empty()),
            );
        }

        if let Some(transitions) = &self.jira_transitions {
            for entry in transitions.entries() {
                if let Some(comment) = entry.comment.as_deref() {
                    validate_comment_template(comment)?;
                }
            }
            settings = settings.with_transitions(transitions.clone());
        }
        Ok(settings)
    }

    /// Returns the configured tracker host.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingHost`] when no host is configured.
    pub fn host(&self) -> Result<&str, ConfigError> {
        self.jira_host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .ok_or(ConfigError::MissingHost)
    }

    fn ticket_matcher(&self) -> Result<TicketMatcher, ReleaseDomainError> {
        match (&self.ticket_regex, &self.ticket_prefixes) {
            (Some(pattern), _) => TicketMatcher::from_pattern(pattern),
            (None, Some(prefixes)) => TicketMatcher::from_prefixes(prefixes),
            (None, None) => Err(ReleaseDomainError::MissingTicketPattern),
        }
    }

    fn templates(&self) -> ReleaseTemplates {
        let mut templates = ReleaseTemplates::default();
        if let Some(name) = &self.release_name_template {
            templates = templates.with_version_name(name.clone());
        }
        if let Some(description) = &self.release_description_template {
            templates = templates.with_description(description.clone());
        }
        templates
    }
}

/// Resolves tracker credentials through `lookup`, usually [`std::env::var`].
///
/// `JIRA_AUTH` wins when set; otherwise both `JIRA_EMAIL` and `JIRA_TOKEN`
/// are required.
///
/// # Errors
///
/// Returns [`ConfigError::MissingCredentials`] when neither form is present,
/// or [`ConfigError::Credentials`] when the values are malformed.
pub fn credentials_from<F>(lookup: F) -> Result<JiraCredentials, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
    if let Some(encoded) = non_empty(JIRA_AUTH_ENV) {
        return Ok(JiraCredentials::from_encoded(encoded)?);
    }
    match (non_empty(JIRA_EMAIL_ENV), non_empty(JIRA_TOKEN_ENV)) {
        (Some(email), Some(token)) => Ok(JiraCredentials::from_email_token(&email, &token)?),
        _ => Err(ConfigError::MissingCredentials),
    }
}

/// Reads a UTF-8 text file through a capability handle on its parent
/// directory.
///
/// # Errors
///
/// Returns the I/O error when the directory or file cannot be read.
pub fn read_text_file(path: &Utf8Path) -> std::io::Result<String> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "config path has no file name")
    })?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.read_to_string(file_name)
}
