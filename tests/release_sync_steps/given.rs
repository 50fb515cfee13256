//! Given steps for release synchronization BDD scenarios.

use super::world::{PROJECT_ID, ReleaseWorld, ticket};
use release_sync::release::domain::{
    BranchTransition, Commit, StateId, TransitionOption, VersionId, VersionRecord,
};
use rstest_bdd_macros::given;

#[given(r#"a tracker project "{key}""#)]
fn tracker_project(world: &mut ReleaseWorld, key: String) {
    world.tracker = world.tracker.clone().with_project(PROJECT_ID, key.as_str());
    world.project_key = key;
}

#[given(r#"ticket "{key}" is in "{status}" and can move to "{target}""#)]
fn ticket_with_transition(
    world: &mut ReleaseWorld,
    key: String,
    status: String,
    target: String,
) -> Result<(), eyre::Report> {
    let option = TransitionOption::new(StateId::new(&target)?, target);
    world.tracker = world
        .tracker
        .clone()
        .with_issue(&ticket(&key)?, status, [option]);
    Ok(())
}

#[given(r#"ticket "{key}" is in "{status}" with no transitions"#)]
fn ticket_without_transitions(
    world: &mut ReleaseWorld,
    key: String,
    status: String,
) -> Result<(), eyre::Report> {
    world.tracker = world.tracker.clone().with_issue(&ticket(&key)?, status, []);
    Ok(())
}

#[given(r#"branch "{branch}" moves tickets to "{target}""#)]
fn branch_moves_tickets(
    world: &mut ReleaseWorld,
    branch: String,
    target: String,
) -> Result<(), eyre::Report> {
    let entry = BranchTransition::targeting(StateId::new(&target)?);
    world.transitions = world.transitions.clone().with_branch(branch, entry);
    Ok(())
}

#[given(r#"an open pre-release "{name}""#)]
fn open_pre_release(world: &mut ReleaseWorld, name: String) -> Result<(), eyre::Report> {
    let record = VersionRecord {
        id: VersionId::new("900")?,
        ..VersionRecord::dry_run_placeholder(name)
    };
    world.tracker = world.tracker.clone().with_version(PROJECT_ID, record);
    Ok(())
}

#[given(r#"a commit "{message}""#)]
fn a_commit(world: &mut ReleaseWorld, message: String) {
    let short_hash = format!("c0ffee{}", world.commits.len());
    world.commits.push(Commit::new(short_hash, message));
}

#[given("dry-run mode is enabled")]
fn dry_run_enabled(world: &mut ReleaseWorld) {
    world.dry_run = true;
}

#[given(r#"fix version updates for "{key}" fail with status {status:u16}"#)]
fn fix_version_updates_fail(
    world: &mut ReleaseWorld,
    key: String,
    status: u16,
) -> Result<(), eyre::Report> {
    world.tracker = world
        .tracker
        .clone()
        .failing_fix_version(&ticket(&key)?, status);
    Ok(())
}
