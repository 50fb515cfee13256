//! Complete release runs against the in-memory tracker.

use super::helpers::{
    PROJECT_ID, count_calls, release, service, settings, ticket, tracker,
};
use release_sync::release::{
    adapters::memory::{InMemoryTracker, TrackerCall},
    ports::IssueEdit,
    services::{ActionOutcome, TicketAction},
};
use rstest::rstest;
use std::num::NonZeroUsize;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn production_release_end_to_end(tracker: InMemoryTracker) -> eyre::Result<()> {
    let sync = service(&tracker, settings()?);
    let production = release("master", "2.3.0", &["ABC-1 fix login", "ABC-2 audit trail"])?;

    let report = sync.run(&production).await?;

    assert_eq!(report.tickets, vec![ticket("ABC-1")?, ticket("ABC-2")?]);
    assert_eq!(
        count_calls(&tracker, |call| matches!(call, TrackerCall::CreateVersion(_))),
        1
    );
    assert_eq!(
        count_calls(&tracker, |call| matches!(
            call,
            TrackerCall::EditIssue(_, IssueEdit::AddFixVersion(_))
        )),
        2
    );
    assert_eq!(
        count_calls(&tracker, |call| matches!(call, TrackerCall::UpdateVersion(_))),
        1
    );
    assert_eq!(
        count_calls(&tracker, |call| matches!(call, TrackerCall::SearchIssues(_))),
        1
    );

    let version = report
        .version
        .ok_or_else(|| eyre::eyre!("release version missing"))?;
    assert_eq!(version.name, "[PRODUCTION] v2.3.0");
    assert!(
        tracker
            .versions(PROJECT_ID)
            .iter()
            .any(|stored| stored.name == "[DAILY] v2.3.0 Account" && stored.released)
    );

    for key in ["ABC-1", "ABC-2"] {
        let issue = tracker
            .issue(&ticket(key)?)
            .ok_or_else(|| eyre::eyre!("{key} missing"))?;
        assert_eq!(issue.status, "Done");
        assert_eq!(issue.comments, vec!["Released as part of Done".to_owned()]);
        assert_eq!(issue.fix_versions, vec![version.id.clone()]);
    }

    let orphan = tracker
        .issue(&ticket("ABC-7")?)
        .ok_or_else(|| eyre::eyre!("ABC-7 missing"))?;
    assert_eq!(orphan.status, "Done");
    assert!(orphan.fix_versions.is_empty());
    assert_eq!(
        report.swept.first().map(|record| (&record.action, &record.outcome)),
        Some((&TicketAction::Move, &ActionOutcome::Applied))
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_run_reuses_the_version(tracker: InMemoryTracker) -> eyre::Result<()> {
    let sync = service(&tracker, settings()?);
    let production = release("master", "2.3.0", &["ABC-1 fix login"])?;

    let first = sync.run(&production).await?;
    let second = sync.run(&production).await?;

    assert_eq!(first.version, second.version);
    assert_eq!(
        count_calls(&tracker, |call| matches!(call, TrackerCall::CreateVersion(_))),
        1
    );
    assert!(
        second
            .ticket_actions
            .iter()
            .all(|record| record.outcome == ActionOutcome::NotReachable)
    );
    Ok(())
}

#[rstest]
#[case(1)]
#[case(3)]
#[tokio::test(flavor = "multi_thread")]
async fn concurrency_limit_does_not_change_the_outcome(
    tracker: InMemoryTracker,
    #[case] raw_limit: usize,
) -> eyre::Result<()> {
    let limit = NonZeroUsize::new(raw_limit).ok_or_else(|| eyre::eyre!("limit must be positive"))?;
    let sync = service(&tracker, settings()?.with_network_concurrency(limit));
    let production = release("master", "2.3.0", &["ABC-1", "ABC-2"])?;

    let report = sync.run(&production).await?;

    assert_eq!(report.attachments.len(), 2);
    assert!(
        report
            .attachments
            .iter()
            .all(|record| record.outcome == ActionOutcome::Applied)
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn daily_release_only_tags_tickets(tracker: InMemoryTracker) -> eyre::Result<()> {
    let sync = service(&tracker, settings()?);
    let daily = release("daily", "2.4.0", &["ABC-1 nightly fix"])?;

    let report = sync.run(&daily).await?;

    assert_eq!(
        report.version.map(|version| version.name),
        Some("[DAILY] v2.4.0".to_owned())
    );
    assert!(report.ticket_actions.is_empty());
    assert!(report.closed_pre_releases.is_empty());
    let issue = tracker
        .issue(&ticket("ABC-1")?)
        .ok_or_else(|| eyre::eyre!("ABC-1 missing"))?;
    assert_eq!(issue.status, "In Review");
    assert_eq!(issue.fix_versions.len(), 1);
    Ok(())
}
