//! Runs configured from a JSON file read through a capability directory.

use super::helpers::{PROJECT_ID, release, ticket, tracker};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use mockable::DefaultClock;
use release_sync::config::{ConfigError, SyncConfig};
use release_sync::release::{adapters::memory::InMemoryTracker, services::ReleaseSyncService};
use rstest::rstest;
use std::sync::Arc;

const CONFIG: &str = r#"{
    "projectId": "ABC",
    "jiraHost": "acme.atlassian.net",
    "ticketPrefixes": ["ABC"],
    "releaseNameTemplate": "web-{{ version }}",
    "setReleaseDate": true,
    "networkConcurrency": 2,
    "readyStatus": "",
    "jiraTransitions": {
        "master": { "targetState": 41, "comment": "Shipped: {{ new_state }}" }
    }
}"#;

/// Writes `contents` into a fresh directory under the system temp dir.
fn write_config(test_name: &str, contents: &str) -> eyre::Result<Utf8PathBuf> {
    let temp = Utf8PathBuf::from_path_buf(std::env::temp_dir())
        .map_err(|path| eyre::eyre!("temp dir is not UTF-8: {}", path.display()))?;
    let dir_name = format!("release-sync-{test_name}-{}", std::process::id());
    let root = Dir::open_ambient_dir(&temp, ambient_authority())?;
    root.create_dir_all(&dir_name)?;
    root.open_dir(&dir_name)?.write("release-sync.json", contents)?;
    Ok(temp.join(dir_name).join("release-sync.json"))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn configured_run_applies_file_settings(tracker: InMemoryTracker) -> eyre::Result<()> {
    let path = write_config("configured-run", CONFIG)?;
    let config = SyncConfig::load(&path)?;
    assert_eq!(config.host()?, "acme.atlassian.net");

    let sync = ReleaseSyncService::new(
        Arc::new(tracker.clone()),
        Arc::new(DefaultClock),
        config.to_settings()?,
    );
    let report = sync
        .run(&release("master", "2.3.0", &["ABC-1 fix login"])?)
        .await?;

    let version = report
        .version
        .ok_or_else(|| eyre::eyre!("release version missing"))?;
    assert_eq!(version.name, "web-2.3.0");
    assert!(version.release_date.is_some());
    assert!(report.swept.is_empty());
    assert!(
        tracker
            .versions(PROJECT_ID)
            .iter()
            .any(|stored| stored.name == "web-2.3.0")
    );

    let issue = tracker
        .issue(&ticket("ABC-1")?)
        .ok_or_else(|| eyre::eyre!("ABC-1 missing"))?;
    assert_eq!(issue.comments, vec!["Shipped: Done".to_owned()]);
    Ok(())
}

#[rstest]
fn malformed_file_is_a_parse_error() -> eyre::Result<()> {
    let path = write_config("malformed", "{ \"projectId\": ")?;

    let result = SyncConfig::load(Utf8Path::new(path.as_str()));

    assert!(matches!(result, Err(ConfigError::Parse { .. })));
    Ok(())
}
