//! When steps for release synchronization BDD scenarios.

use super::world::{ReleaseWorld, run_async};
use release_sync::release::domain::ReleaseContext;
use rstest_bdd_macros::when;

#[when(r#"release "{version}" is published from "{branch}""#)]
fn publish_release(
    world: &mut ReleaseWorld,
    version: String,
    branch: String,
) -> Result<(), eyre::Report> {
    let release = ReleaseContext::new(branch, semver::Version::parse(&version)?)
        .with_commits(world.commits.clone());
    let service = world.service()?;
    world.result = Some(run_async(service.run(&release)));
    Ok(())
}
