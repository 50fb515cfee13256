//! Synchronizes a Jira project with a code release.
//!
//! Usage:
//!
//! ```text
//! release-sync --branch master --version 2.3.0 --range v2.2.0..HEAD
//! ```
//!
//! The configuration file (default `release-sync.json`) names the project,
//! the ticket prefixes, and the per-branch transitions. Credentials are read
//! from `JIRA_AUTH`, or from `JIRA_EMAIL` and `JIRA_TOKEN`. The process exits
//! with status 0 when the run completes and 1 on any fatal error.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use mockable::DefaultClock;
use release_sync::config::{ConfigError, SyncConfig, credentials_from, read_text_file};
use release_sync::release::{
    adapters::{
        git::GitCommitSource,
        jira::{JiraClientError, JiraTracker},
    },
    domain::ReleaseContext,
    ports::{CommitSource, CommitSourceError},
    services::{ActionOutcome, ReleaseSyncError, ReleaseSyncReport, ReleaseSyncService},
};
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "release-sync")]
#[command(about = "Move, comment on, and tag Jira tickets referenced by a release")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, env = "RELEASE_SYNC_CONFIG", default_value = "release-sync.json")]
    config: Utf8PathBuf,

    /// Branch the release was cut from.
    #[arg(long, env = "RELEASE_BRANCH")]
    branch: String,

    /// Semantic version being released.
    #[arg(long, env = "RELEASE_VERSION")]
    version: semver::Version,

    /// Release notes text.
    #[arg(long, conflicts_with = "notes_file")]
    notes: Option<String>,

    /// File holding the release notes.
    #[arg(long)]
    notes_file: Option<Utf8PathBuf>,

    /// Git revision range holding the release commits.
    #[arg(long, default_value = "HEAD")]
    range: String,

    /// Git checkout to read commits from.
    #[arg(long, default_value = ".")]
    repository: Utf8PathBuf,

    /// Log every decision without writing to Jira.
    #[arg(long)]
    dry_run: bool,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

/// Errors that abort the command.
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read release notes {path}: {source}")]
    Notes {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Commits(#[from] CommitSourceError),

    #[error(transparent)]
    Client(#[from] JiraClientError),

    #[error(transparent)]
    Sync(#[from] ReleaseSyncError),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(&cli) {
        Ok(report) => {
            log_summary(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "release sync failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn run(cli: &Cli) -> Result<ReleaseSyncReport, CliError> {
    let mut config = SyncConfig::load(&cli.config)?;
    config.dry_run |= cli.dry_run;
    let settings = config.to_settings()?;

    let release = release_context(cli)?;
    let credentials = credentials_from(|name| std::env::var(name).ok())?;
    let tracker = JiraTracker::new(config.host()?, &credentials)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let service = ReleaseSyncService::new(Arc::new(tracker), Arc::new(DefaultClock), settings);
    Ok(runtime.block_on(service.run(&release))?)
}

fn release_context(cli: &Cli) -> Result<ReleaseContext, CliError> {
    let commits = GitCommitSource::new(&cli.repository).commits(&cli.range)?;
    info!(count = commits.len(), range = %cli.range, "read release commits");

    let notes = match (&cli.notes, &cli.notes_file) {
        (Some(notes), _) => notes.clone(),
        (None, Some(path)) => read_text_file(path).map_err(|source| CliError::Notes {
            path: path.clone(),
            source,
        })?,
        (None, None) => String::new(),
    };

    Ok(ReleaseContext::new(&cli.branch, cli.version.clone())
        .with_commits(commits)
        .with_notes(notes))
}

fn log_summary(report: &ReleaseSyncReport) {
    let failed = report
        .ticket_actions
        .iter()
        .chain(&report.swept)
        .chain(&report.attachments)
        .filter(|record| matches!(record.outcome, ActionOutcome::Failed(_)))
        .count();
    info!(
        tickets = report.tickets.len(),
        version = report.version.as_ref().map(|version| version.name.as_str()),
        closed_pre_releases = report.closed_pre_releases.len(),
        swept = report.swept.len(),
        attached = report.attachments.len(),
        failed,
        "release sync finished"
    );
}
