//! Then steps for release synchronization BDD scenarios.

use super::world::{PROJECT_ID, ReleaseWorld, ticket};
use release_sync::release::{
    adapters::memory::IssueSnapshot, services::ReleaseSyncError,
};
use rstest_bdd_macros::then;

fn issue(world: &ReleaseWorld, key: &str) -> Result<IssueSnapshot, eyre::Report> {
    world
        .tracker
        .issue(&ticket(key)?)
        .ok_or_else(|| eyre::eyre!("ticket {key} is not in the tracker"))
}

#[then("the run succeeds")]
fn run_succeeds(world: &ReleaseWorld) -> Result<(), eyre::Report> {
    world.report().map(drop)
}

#[then(r#"the run fails for ticket "{key}""#)]
fn run_fails_for_ticket(world: &ReleaseWorld, key: String) -> Result<(), eyre::Report> {
    match world.result.as_ref() {
        Some(Err(ReleaseSyncError::Attach { ticket: failed, .. })) if failed.as_str() == key => {
            Ok(())
        }
        Some(Err(err)) => Err(eyre::eyre!("run failed for another reason: {err}")),
        Some(Ok(_)) => Err(eyre::eyre!("expected the run to fail")),
        None => Err(eyre::eyre!("release has not been published in this scenario")),
    }
}

#[then(r#"the release version is named "{name}""#)]
fn release_version_named(world: &ReleaseWorld, name: String) -> Result<(), eyre::Report> {
    let version = world
        .report()?
        .version
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no release version was resolved"))?;
    if version.name != name {
        return Err(eyre::eyre!("expected version {name}, found {}", version.name));
    }
    Ok(())
}

#[then(r#"ticket "{key}" is in "{status}""#)]
fn ticket_in_status(world: &ReleaseWorld, key: String, status: String) -> Result<(), eyre::Report> {
    let found = issue(world, &key)?.status;
    if found != status {
        return Err(eyre::eyre!("expected {key} in {status}, found {found}"));
    }
    Ok(())
}

#[then(r#"ticket "{key}" has {count:usize} comments"#)]
fn ticket_comment_count(
    world: &ReleaseWorld,
    key: String,
    count: usize,
) -> Result<(), eyre::Report> {
    let comments = issue(world, &key)?.comments;
    if comments.len() != count {
        return Err(eyre::eyre!(
            "expected {count} comments on {key}, found {comments:?}"
        ));
    }
    Ok(())
}

#[then(r#"ticket "{key}" is tagged with the release version"#)]
fn ticket_tagged(world: &ReleaseWorld, key: String) -> Result<(), eyre::Report> {
    let version_name = match world.result.as_ref() {
        Some(Ok(report)) => report.version.as_ref().map(|version| version.name.clone()),
        _ => None,
    };
    let stored = world.tracker.versions(PROJECT_ID);
    let fix_versions = issue(world, &key)?.fix_versions;
    let tagged = fix_versions.iter().any(|id| {
        stored
            .iter()
            .any(|version| &version.id == id && version_name.as_ref().is_none_or(|name| &version.name == name))
    });
    if !tagged {
        return Err(eyre::eyre!("{key} does not carry the release version"));
    }
    Ok(())
}

#[then(r#"ticket "{key}" has no fix version"#)]
fn ticket_untagged(world: &ReleaseWorld, key: String) -> Result<(), eyre::Report> {
    let fix_versions = issue(world, &key)?.fix_versions;
    if !fix_versions.is_empty() {
        return Err(eyre::eyre!("{key} unexpectedly carries {fix_versions:?}"));
    }
    Ok(())
}

#[then(r#"pre-release "{name}" is released"#)]
fn pre_release_released(world: &ReleaseWorld, name: String) -> Result<(), eyre::Report> {
    let released = world
        .tracker
        .versions(PROJECT_ID)
        .into_iter()
        .any(|version| version.name == name && version.released);
    if !released {
        return Err(eyre::eyre!("pre-release {name} is still open"));
    }
    Ok(())
}

#[then("the tracker received no calls")]
fn tracker_untouched(world: &ReleaseWorld) -> Result<(), eyre::Report> {
    let calls = world.tracker.calls();
    if !calls.is_empty() {
        return Err(eyre::eyre!("unexpected tracker calls: {calls:?}"));
    }
    Ok(())
}

#[then("the tracker received no writes")]
fn tracker_unwritten(world: &ReleaseWorld) -> Result<(), eyre::Report> {
    let writes = world.tracker.write_calls();
    if !writes.is_empty() {
        return Err(eyre::eyre!("unexpected tracker writes: {writes:?}"));
    }
    Ok(())
}
