mod common;

use ci_dispatch::jira::adf;
use ci_dispatch::jira::status::{SkipReason, find_transition};
use ci_dispatch::jira::{StatusOutcome, StatusUpdate, TrackerError, update_issue_status};
use common::{FakeTracker, TrackerCall, issue, transition};

fn czech_transitions() -> Vec<ci_dispatch::jira::Transition> {
    vec![
        transition("1", "Otevřeno"),
        transition("5", "Čekání"),
        transition("9", "Hotovo"),
    ]
}

#[tokio::test]
async fn done_issue_is_left_alone() {
    let tracker = FakeTracker::default().transitions("A-1", czech_transitions());
    let done = issue("A-1", "Hotovo", "done");
    let mut update = StatusUpdate::new("Otevřeno");
    update.comment = Some("Reopened by CI".into());

    let outcome = update_issue_status(&tracker, &done, &update).await.unwrap();

    assert!(matches!(
        outcome,
        StatusOutcome::Skipped(SkipReason::AlreadyDone { .. })
    ));
    assert!(tracker.calls().is_empty());
}

#[tokio::test]
async fn ignored_status_is_left_alone_in_any_spelling() {
    let tracker = FakeTracker::default();
    let blocked = issue("A-1", "Blokováno", "indeterminate");
    let mut update = StatusUpdate::new("Hotovo");
    update.ignore_statuses = vec!["BLOKOVANO".into()];

    let outcome = update_issue_status(&tracker, &blocked, &update).await.unwrap();

    assert!(matches!(
        outcome,
        StatusOutcome::Skipped(SkipReason::Ignored { .. })
    ));
    assert!(tracker.calls().is_empty());
}

#[tokio::test]
async fn already_at_target_is_left_alone() {
    let tracker = FakeTracker::default();
    let waiting = issue("A-1", "Čekání", "indeterminate");
    let update = StatusUpdate::new("cekani");

    let outcome = update_issue_status(&tracker, &waiting, &update).await.unwrap();

    assert!(matches!(
        outcome,
        StatusOutcome::Skipped(SkipReason::AlreadyAtTarget { .. })
    ));
    assert!(tracker.calls().is_empty());
}

#[tokio::test]
async fn open_issue_moves_to_done_and_gets_one_comment() {
    let tracker = FakeTracker::default().transitions("A-1", czech_transitions());
    let open = issue("A-1", "Otevřeno", "new");
    let mut update = StatusUpdate::new("hotovo");
    update.comment = Some("Nasazeno do **produkce**".into());

    let outcome = update_issue_status(&tracker, &open, &update).await.unwrap();

    assert_eq!(
        outcome,
        StatusOutcome::Transitioned {
            transition_id: "9".into()
        }
    );
    assert_eq!(
        tracker.calls(),
        vec![
            TrackerCall::ListTransitions("A-1".into()),
            TrackerCall::Apply {
                key: "A-1".into(),
                transition_id: "9".into()
            },
            TrackerCall::Comment {
                key: "A-1".into(),
                body: adf::from_markdown("Nasazeno do **produkce**"),
            },
        ]
    );
}

#[tokio::test]
async fn no_comment_means_no_comment_call() {
    let tracker = FakeTracker::default().transitions("A-1", czech_transitions());
    let open = issue("A-1", "Otevřeno", "new");

    update_issue_status(&tracker, &open, &StatusUpdate::new("Čekání"))
        .await
        .unwrap();

    assert!(
        !tracker
            .calls()
            .iter()
            .any(|c| matches!(c, TrackerCall::Comment { .. }))
    );
}

#[tokio::test]
async fn missing_transition_lists_what_is_available() {
    let tracker = FakeTracker::default().transitions("A-1", czech_transitions());
    let open = issue("A-1", "Otevřeno", "new");

    let err = update_issue_status(&tracker, &open, &StatusUpdate::new("Zamítnuto"))
        .await
        .unwrap_err();

    match &err {
        TrackerError::TransitionNotFound { available, .. } => {
            assert_eq!(available, &vec!["Otevřeno", "Čekání", "Hotovo"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("Otevřeno, Čekání, Hotovo"), "{message}");
    assert!(
        !tracker
            .calls()
            .iter()
            .any(|c| matches!(c, TrackerCall::Apply { .. }))
    );
}

#[tokio::test]
async fn first_canonical_match_wins() {
    let tracker = FakeTracker::default().transitions(
        "A-1",
        vec![transition("1", "Hotovo"), transition("2", "hotovo")],
    );
    let found = find_transition(&tracker, "A-1", "HOTOVO").await.unwrap();
    assert_eq!(found.id, "1");
}

#[tokio::test]
async fn blank_comment_fails_before_any_remote_call() {
    let tracker = FakeTracker::default().transitions("A-1", czech_transitions());
    let open = issue("A-1", "Otevřeno", "new");
    let mut update = StatusUpdate::new("Hotovo");
    update.comment = Some("   ".into());

    let err = update_issue_status(&tracker, &open, &update)
        .await
        .unwrap_err();

    assert!(matches!(err, TrackerError::Validation(_)));
    assert!(tracker.calls().is_empty());
}

#[tokio::test]
async fn comment_failure_keeps_the_transition() {
    let tracker = FakeTracker::default()
        .transitions("A-1", czech_transitions())
        .failing_comment("A-1");
    let open = issue("A-1", "Otevřeno", "new");
    let mut update = StatusUpdate::new("Hotovo");
    update.comment = Some("Done".into());

    let result = update_issue_status(&tracker, &open, &update).await;

    assert!(result.is_err());
    assert!(tracker.calls().contains(&TrackerCall::Apply {
        key: "A-1".into(),
        transition_id: "9".into()
    }));
}
