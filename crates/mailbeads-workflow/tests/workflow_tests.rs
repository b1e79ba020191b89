// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Workflow integration tests over a real on-disk store with mock
//! collaborators. Each test builds its own project and is order-insensitive.

use std::time::Duration;

use mailbeads_config::model::SyncConfig;
use mailbeads_core::{
    CLOSE_REASON_DISMISSED, CLOSE_REASON_DONE, Issue, IssueTracker, MailbeadsError, Priority,
    Status,
};
use mailbeads_storage::SchemaGeneration;
use mailbeads_storage::queries::{emails, ledger, refs, threads};
use mailbeads_test_utils::{MockMailProvider, MockTracker, TestStore, email};
use mailbeads_workflow::reconcile::{MIGRATED_NOTE, migrate_legacy, reconcile_refs};
use mailbeads_workflow::status::{TriageSource, stats, status};
use mailbeads_workflow::sync::{SyncOptions, notify_new_mail, sync};
use mailbeads_workflow::triage::{
    TriageRequest, close_local, close_tracked, snooze_local, triage_local, triage_tracked,
};
use mailbeads_workflow::views::{InboxFilter, inbox_tracked, ready_local, show_thread};

const ALICE: &str = "alice@example.com";
const WORK: &str = "me@work.com";

fn labels() -> Vec<String> {
    vec!["email".to_string(), "triage".to_string()]
}

fn request(thread_id: &str, priority: &str, action: &str) -> TriageRequest {
    TriageRequest {
        thread_id: thread_id.to_string(),
        priority: Some(priority.to_string()),
        action: action.to_string(),
        ..Default::default()
    }
}

// ---- Sync ----

#[tokio::test]
async fn test_sync_continues_past_failing_account() {
    let store = TestStore::cross_reference().await.unwrap();
    let provider = MockMailProvider::new();
    provider
        .add_message(
            ALICE,
            MockMailProvider::message("m1", "t1", "bob@x.com", "Lunch", "Mon, 2 Mar 2026 10:00:00 +0000"),
        )
        .await;
    provider
        .add_message(
            ALICE,
            MockMailProvider::message("m2", "t1", "carol@x.com", "Re: Lunch", "Tue, 3 Mar 2026 09:00:00 +0000"),
        )
        .await;
    provider.add_account("broken@example.com").await;
    provider.fail_account("broken@example.com").await;

    let summary = sync(
        store.db(),
        &provider,
        None,
        &SyncConfig::default(),
        &SyncOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(summary.total_new, 2);
    assert_eq!(summary.total_in_db, 2);
    let alice = summary.accounts.iter().find(|r| r.account == ALICE).unwrap();
    assert_eq!(alice.fetched, 2);
    assert!(alice.error.is_none());
    let broken = summary
        .accounts
        .iter()
        .find(|r| r.account == "broken@example.com")
        .unwrap();
    assert!(broken.error.as_deref().unwrap().starts_with("search failed"));

    let thread = threads::thread_info(store.db(), "t1", ALICE).await.unwrap();
    assert_eq!(thread.email_count, 2);
    // Subject and sender are the greatest values across the thread.
    assert_eq!(thread.subject, "Re: Lunch");
}

#[tokio::test]
async fn test_second_sync_is_incremental_and_skips_known_messages() {
    let store = TestStore::cross_reference().await.unwrap();
    let provider = MockMailProvider::new();
    provider
        .add_message(
            ALICE,
            MockMailProvider::message("m1", "t1", "bob@x.com", "Lunch", "Tue, 3 Mar 2026 09:00:00 +0000"),
        )
        .await;
    let config = SyncConfig::default();

    sync(store.db(), &provider, None, &config, &SyncOptions::default())
        .await
        .unwrap();
    let second = sync(store.db(), &provider, None, &config, &SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(second.total_new, 0);
    assert_eq!(second.accounts[0].skipped, 1);
    let queries = provider.queries().await;
    assert_eq!(queries[0].1, "newer_than:3d in:inbox");
    assert_eq!(queries[1].1, "after:2026/03/03 in:inbox");
}

#[tokio::test]
async fn test_sync_unknown_account_reports_missing_credentials() {
    let store = TestStore::cross_reference().await.unwrap();
    let provider = MockMailProvider::new();
    provider.add_account(ALICE).await;

    let summary = sync(
        store.db(),
        &provider,
        None,
        &SyncConfig::default(),
        &SyncOptions {
            account: Some("nobody@example.com".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(summary.accounts.len(), 1);
    assert_eq!(
        summary.accounts[0].error.as_deref(),
        Some("credentials not found")
    );
    assert!(provider.queries().await.is_empty());
}

#[tokio::test]
async fn test_sync_without_accounts_is_config_error() {
    let store = TestStore::cross_reference().await.unwrap();
    let err = sync(
        store.db(),
        &MockMailProvider::new(),
        None,
        &SyncConfig::default(),
        &SyncOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, MailbeadsError::Config(_)));
}

#[tokio::test]
async fn test_new_mail_on_triaged_thread_comments_once() {
    let store = TestStore::cross_reference().await.unwrap();
    let tracker = MockTracker::new();
    let provider = MockMailProvider::new();
    let config = SyncConfig::default();
    provider
        .add_message(
            ALICE,
            MockMailProvider::message("m1", "t1", "bob@x.com", "Budget", "Mon, 2 Mar 2026 10:00:00 +0000"),
        )
        .await;
    sync(store.db(), &provider, Some(&tracker), &config, &SyncOptions::default())
        .await
        .unwrap();
    let outcome = triage_tracked(store.db(), &tracker, &request("t1", "high", "Approve budget"))
        .await
        .unwrap();

    // Stored timestamps have second resolution.
    tokio::time::sleep(Duration::from_millis(1100)).await;
    provider
        .add_message(
            ALICE,
            MockMailProvider::message("m2", "t1", "carol@x.com", "Re: Budget", "Tue, 3 Mar 2026 10:00:00 +0000"),
        )
        .await;
    let summary = sync(store.db(), &provider, Some(&tracker), &config, &SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.accounts[0].commented, 1);
    let comments = tracker.comments().await;
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].0, outcome.id);
    assert_eq!(
        comments[0].1,
        "New email activity on thread: Re: Budget (2 emails, latest from carol@x.com)"
    );

    assert_eq!(notify_new_mail(store.db(), &tracker).await, 0);
    assert_eq!(tracker.comments().await.len(), 1);
}

#[tokio::test]
async fn test_notify_skips_placeholder_refs() {
    let store = TestStore::self_contained().await.unwrap();
    store
        .seed(&[email("m1", ALICE, "t1", "Mon, 2 Mar 2026 10:00:00 +0000")])
        .await
        .unwrap();
    triage_local(store.db(), &request("t1", "low", "Read later"))
        .await
        .unwrap();
    let store = store.reopen(SchemaGeneration::CrossReference).await.unwrap();

    let mut later = email("m2", ALICE, "t1", "Tue, 3 Mar 2026 10:00:00 +0000");
    later.fetched_at = "2099-01-01T00:00:00Z".to_string();
    store.seed(&[later]).await.unwrap();
    assert_eq!(refs::threads_with_new_mail(store.db()).await.unwrap().len(), 1);

    let tracker = MockTracker::new();
    assert_eq!(notify_new_mail(store.db(), &tracker).await, 0);
    assert!(tracker.calls().await.is_empty());
}

// ---- Triage (cross-reference) ----

#[tokio::test]
async fn test_triage_creates_then_updates_issue() {
    let store = TestStore::cross_reference().await.unwrap();
    let tracker = MockTracker::new();
    store
        .seed(&[email("m1", ALICE, "t1", "Mon, 2 Mar 2026 10:00:00 +0000")])
        .await
        .unwrap();

    let mut first = request("t1", "medium", "Reply to Bob");
    first.category = Some("work".into());
    first.agent_notes = Some("asks for a date".into());
    let created = triage_tracked(store.db(), &tracker, &first).await.unwrap();
    assert!(created.created);
    assert_eq!(created.id, "bd-1");
    assert_eq!(created.account, ALICE);

    let issue = tracker.issue("bd-1").await.unwrap();
    assert_eq!(issue.external_ref.as_deref(), Some("mb:t1"));
    assert_eq!(
        issue.notes.as_deref(),
        Some("from=sender@example.com account=alice@example.com thread=t1 emails=1\n\nasks for a date")
    );
    assert!(issue.labels.contains(&"work".to_string()));
    assert_eq!(threads::untriaged_count(store.db()).await.unwrap(), 0);

    let mut second = request("t1", "high", "Call Bob today");
    second.suggestion = Some("Call before noon".into());
    let updated = triage_tracked(store.db(), &tracker, &second).await.unwrap();
    assert!(!updated.created);
    assert_eq!(updated.id, "bd-1");

    let issue = tracker.issue("bd-1").await.unwrap();
    assert_eq!(issue.title, "Call Bob today");
    assert_eq!(issue.priority, 1);
    assert_eq!(issue.description.as_deref(), Some("Call before noon"));
    assert_eq!(tracker.issues().await.len(), 1);
    assert_eq!(refs::count_refs(store.db()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_invalid_triage_never_reaches_tracker() {
    let store = TestStore::cross_reference().await.unwrap();
    let tracker = MockTracker::new();
    store
        .seed(&[email("m1", ALICE, "t1", "Mon, 2 Mar 2026 10:00:00 +0000")])
        .await
        .unwrap();

    let err = triage_tracked(store.db(), &tracker, &request("t1", "urgent", "Reply"))
        .await
        .unwrap_err();
    assert!(matches!(err, MailbeadsError::Validation(_)));
    let err = triage_tracked(store.db(), &tracker, &request("t1", "high", " "))
        .await
        .unwrap_err();
    assert!(matches!(err, MailbeadsError::Validation(_)));

    assert!(tracker.calls().await.is_empty());
    assert_eq!(refs::count_refs(store.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_triage_requires_account_for_shared_thread() {
    let store = TestStore::cross_reference().await.unwrap();
    let tracker = MockTracker::new();
    store
        .seed(&[
            email("m1", ALICE, "t1", "Mon, 2 Mar 2026 10:00:00 +0000"),
            email("m2", WORK, "t1", "Mon, 2 Mar 2026 11:00:00 +0000"),
        ])
        .await
        .unwrap();

    let err = triage_tracked(store.db(), &tracker, &request("t1", "low", "Read"))
        .await
        .unwrap_err();
    match err {
        MailbeadsError::AmbiguousAccount { accounts, .. } => {
            assert_eq!(accounts, vec![ALICE.to_string(), WORK.to_string()]);
        }
        other => panic!("expected ambiguous account, got {other:?}"),
    }
    assert!(tracker.issues().await.is_empty());

    let mut scoped = request("t1", "low", "Read");
    scoped.account = Some(WORK.into());
    let outcome = triage_tracked(store.db(), &tracker, &scoped).await.unwrap();
    assert_eq!(outcome.account, WORK);
}

#[tokio::test]
async fn test_triage_with_unavailable_tracker_fails_fast() {
    let store = TestStore::cross_reference().await.unwrap();
    let tracker = MockTracker::new();
    tracker.set_available(false).await;
    store
        .seed(&[email("m1", ALICE, "t1", "Mon, 2 Mar 2026 10:00:00 +0000")])
        .await
        .unwrap();

    let err = triage_tracked(store.db(), &tracker, &request("t1", "low", "Read"))
        .await
        .unwrap_err();
    assert!(matches!(err, MailbeadsError::TrackerUnavailable(_)));
}

#[tokio::test]
async fn test_close_continues_after_failure_and_drops_refs() {
    let store = TestStore::cross_reference().await.unwrap();
    let tracker = MockTracker::new();
    store
        .seed(&[
            email("m1", ALICE, "t1", "Mon, 2 Mar 2026 10:00:00 +0000"),
            email("m2", ALICE, "t2", "Mon, 2 Mar 2026 11:00:00 +0000"),
        ])
        .await
        .unwrap();
    let one = triage_tracked(store.db(), &tracker, &request("t1", "high", "A"))
        .await
        .unwrap();
    let two = triage_tracked(store.db(), &tracker, &request("t2", "low", "B"))
        .await
        .unwrap();
    tracker.fail_id(&one.id).await;

    let ids = vec![one.id.clone(), two.id.clone()];
    let outcomes = close_tracked(store.db(), &tracker, &ids, CLOSE_REASON_DONE)
        .await
        .unwrap();

    assert!(!outcomes[0].closed);
    assert!(outcomes[0].error.is_some());
    assert!(outcomes[1].closed);
    assert!(outcomes[1].ref_removed);
    assert!(refs::get_ref(store.db(), "t1", ALICE).await.unwrap().is_some());
    assert!(refs::get_ref(store.db(), "t2", ALICE).await.unwrap().is_none());
    let closed = tracker.issue(&two.id).await.unwrap();
    assert_eq!(closed.close_reason.as_deref(), Some(CLOSE_REASON_DONE));

    // A closed thread does not reappear as untriaged without new mail.
    let untriaged = threads::untriaged_threads(store.db(), None, None).await.unwrap();
    assert!(untriaged.is_empty());
}

#[tokio::test]
async fn test_failed_ref_delete_after_close_is_repaired_by_reconcile() {
    let store = TestStore::cross_reference().await.unwrap();
    let tracker = MockTracker::new();
    store
        .seed(&[email("m1", ALICE, "t1", "Mon, 2 Mar 2026 10:00:00 +0000")])
        .await
        .unwrap();
    let issue = triage_tracked(store.db(), &tracker, &request("t1", "high", "A"))
        .await
        .unwrap();

    store
        .db()
        .connection()
        .call(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER refuse_ref_delete BEFORE DELETE ON triage
                 BEGIN SELECT RAISE(ABORT, 'store is read-only'); END;",
            )
        })
        .await
        .unwrap();

    let ids = vec![issue.id.clone()];
    let outcomes = close_tracked(store.db(), &tracker, &ids, CLOSE_REASON_DONE)
        .await
        .unwrap();
    assert!(outcomes[0].closed);
    assert!(!outcomes[0].ref_removed);
    assert!(outcomes[0].error.is_none());
    assert_eq!(
        tracker.issue(&issue.id).await.unwrap().status,
        "closed",
        "tracker close stands even though the local step failed"
    );
    let stale = refs::get_ref(store.db(), "t1", ALICE).await.unwrap().unwrap();
    assert_eq!(stale.external_id, issue.id);

    store
        .db()
        .connection()
        .call(|conn| conn.execute_batch("DROP TRIGGER refuse_ref_delete;"))
        .await
        .unwrap();

    let report = reconcile_refs(store.db(), &tracker, &labels(), false).await.unwrap();
    assert_eq!(report.removed.len(), 1);
    assert_eq!(report.removed[0].external_id, issue.id);
    assert_eq!(report.removed[0].reason, "issue closed");
    assert!(report.errors.is_empty());
    assert!(refs::get_ref(store.db(), "t1", ALICE).await.unwrap().is_none());
}

// ---- Triage (self-contained) ----

#[tokio::test]
async fn test_local_dependency_blocks_until_done() {
    let store = TestStore::self_contained().await.unwrap();
    store
        .seed(&[
            email("m1", ALICE, "t1", "Mon, 2 Mar 2026 10:00:00 +0000"),
            email("m2", ALICE, "t2", "Mon, 2 Mar 2026 11:00:00 +0000"),
        ])
        .await
        .unwrap();
    let parent = triage_local(store.db(), &request("t1", "high", "Plan offsite"))
        .await
        .unwrap();
    let mut child = request("t2", "medium", "Book venue");
    child.depends_on = Some(parent.id.clone());
    let child = triage_local(store.db(), &child).await.unwrap();
    assert_eq!(child.depends_on.as_deref(), Some(parent.id.as_str()));

    let ready: Vec<String> = ready_local(store.db(), None)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ready, vec![parent.id.clone()]);

    let outcomes = close_local(store.db(), &[parent.id.clone()], Status::Done)
        .await
        .unwrap();
    assert!(outcomes[0].closed);
    let ready: Vec<String> = ready_local(store.db(), None)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ready, vec![child.id]);
}

#[tokio::test]
async fn test_local_self_dependency_is_rejected_before_write() {
    let store = TestStore::self_contained().await.unwrap();
    store
        .seed(&[email("m1", ALICE, "t1", "Mon, 2 Mar 2026 10:00:00 +0000")])
        .await
        .unwrap();
    let first = triage_local(store.db(), &request("t1", "low", "Read"))
        .await
        .unwrap();

    let mut again = request("t1", "high", "Read now");
    again.depends_on = Some(first.id.clone());
    let err = triage_local(store.db(), &again).await.unwrap_err();
    assert!(matches!(err, MailbeadsError::Validation(_)));

    let record = ledger::get(store.db(), "t1", ALICE).await.unwrap().unwrap();
    assert_eq!(record.priority, Priority::Low);
}

#[tokio::test]
async fn test_local_close_reports_unknown_ids_and_snooze_hides() {
    let store = TestStore::self_contained().await.unwrap();
    store
        .seed(&[email("m1", ALICE, "t1", "Mon, 2 Mar 2026 10:00:00 +0000")])
        .await
        .unwrap();
    let record = triage_local(store.db(), &request("t1", "medium", "Reply"))
        .await
        .unwrap();

    let snoozed = snooze_local(store.db(), &record.id, "2099-01-01T00:00:00Z")
        .await
        .unwrap();
    assert_eq!(snoozed.id, record.id);
    assert!(ready_local(store.db(), None).await.unwrap().is_empty());

    let ids = vec!["zzzz".to_string(), record.id.clone()];
    let outcomes = close_local(store.db(), &ids, Status::Dismissed).await.unwrap();
    assert!(!outcomes[0].closed);
    assert!(outcomes[1].closed);
    let record = ledger::get(store.db(), "t1", ALICE).await.unwrap().unwrap();
    assert_eq!(record.status, Status::Dismissed);

    // Snoozing does not reopen a closed record.
    assert!(matches!(
        snooze_local(store.db(), &record.id, "2020-01-01").await,
        Err(MailbeadsError::Validation(_))
    ));
    let record = ledger::get(store.db(), "t1", ALICE).await.unwrap().unwrap();
    assert_eq!(record.status, Status::Dismissed);
}

// ---- Migration and reconciliation ----

#[tokio::test]
async fn test_migrate_legacy_replaces_placeholders() {
    let store = TestStore::self_contained().await.unwrap();
    store
        .seed(&[email("m1", ALICE, "t1", "Mon, 2 Mar 2026 10:00:00 +0000")])
        .await
        .unwrap();
    triage_local(store.db(), &request("t1", "high", "Reply"))
        .await
        .unwrap();
    let store = store.reopen(SchemaGeneration::CrossReference).await.unwrap();
    let tracker = MockTracker::new();

    let preview = migrate_legacy(store.db(), &tracker, true).await.unwrap();
    assert_eq!(preview.found, 1);
    assert!(preview.migrated[0].external_id.is_none());
    assert!(tracker.issues().await.is_empty());

    let report = migrate_legacy(store.db(), &tracker, false).await.unwrap();
    assert_eq!(report.migrated.len(), 1);
    let id = report.migrated[0].external_id.clone().unwrap();
    let issue = tracker.issue(&id).await.unwrap();
    assert_eq!(issue.title, "subject t1");
    assert!(issue.notes.unwrap().ends_with(MIGRATED_NOTE));

    let triage_ref = refs::get_ref(store.db(), "t1", ALICE).await.unwrap().unwrap();
    assert_eq!(triage_ref.external_id, id);
    assert!(refs::legacy_refs(store.db()).await.unwrap().is_empty());

    let rerun = migrate_legacy(store.db(), &tracker, false).await.unwrap();
    assert_eq!(rerun.found, 0);
}

#[tokio::test]
async fn test_retriage_of_placeholder_creates_real_issue() {
    let store = TestStore::self_contained().await.unwrap();
    store
        .seed(&[email("m1", ALICE, "t1", "Mon, 2 Mar 2026 10:00:00 +0000")])
        .await
        .unwrap();
    triage_local(store.db(), &request("t1", "high", "Reply"))
        .await
        .unwrap();
    let store = store.reopen(SchemaGeneration::CrossReference).await.unwrap();
    let tracker = MockTracker::new();

    let outcome = triage_tracked(store.db(), &tracker, &request("t1", "low", "Reply later"))
        .await
        .unwrap();
    assert!(outcome.created);
    let triage_ref = refs::get_ref(store.db(), "t1", ALICE).await.unwrap().unwrap();
    assert_eq!(triage_ref.external_id, outcome.id);
    assert!(!tracker.calls().await.iter().any(|c| c.starts_with("update")));
}

#[tokio::test]
async fn test_reconcile_removes_closed_and_restores_missing_refs() {
    let store = TestStore::cross_reference().await.unwrap();
    let tracker = MockTracker::new();
    store
        .seed(&[
            email("m1", ALICE, "t1", "Mon, 2 Mar 2026 10:00:00 +0000"),
            email("m2", ALICE, "t2", "Mon, 2 Mar 2026 11:00:00 +0000"),
        ])
        .await
        .unwrap();
    let closed = triage_tracked(store.db(), &tracker, &request("t1", "high", "A"))
        .await
        .unwrap();
    tracker.close(&closed.id, CLOSE_REASON_DONE).await.unwrap();
    tracker
        .insert_issue(Issue {
            id: "bd-77".into(),
            title: "Orphan".into(),
            notes: Some(format!("from=x@y.com account={ALICE} thread=t2 emails=1")),
            status: "open".into(),
            priority: 3,
            external_ref: Some("mb:t2".into()),
            labels: labels(),
            ..Default::default()
        })
        .await;

    let preview = reconcile_refs(store.db(), &tracker, &labels(), true).await.unwrap();
    assert_eq!(preview.removed.len(), 1);
    assert_eq!(preview.restored.len(), 1);
    assert_eq!(refs::count_refs(store.db()).await.unwrap(), 1);

    let report = reconcile_refs(store.db(), &tracker, &labels(), false).await.unwrap();
    assert_eq!(report.removed[0].external_id, closed.id);
    assert_eq!(report.removed[0].reason, "issue closed");
    assert_eq!(report.restored[0].external_id, "bd-77");
    assert!(refs::get_ref(store.db(), "t1", ALICE).await.unwrap().is_none());
    let restored = refs::get_ref(store.db(), "t2", ALICE).await.unwrap().unwrap();
    assert_eq!(restored.external_id, "bd-77");

    let again = reconcile_refs(store.db(), &tracker, &labels(), false).await.unwrap();
    assert!(again.removed.is_empty());
    assert!(again.restored.is_empty());
    assert_eq!(again.unchanged, 1);
}

// ---- Views and summaries ----

#[tokio::test]
async fn test_show_thread_includes_linked_issue() {
    let store = TestStore::cross_reference().await.unwrap();
    let tracker = MockTracker::new();
    store
        .seed(&[
            email("m2", ALICE, "t1", "Tue, 3 Mar 2026 10:00:00 +0000"),
            email("m1", ALICE, "t1", "Mon, 2 Mar 2026 10:00:00 +0000"),
        ])
        .await
        .unwrap();
    let outcome = triage_tracked(store.db(), &tracker, &request("t1", "medium", "Reply"))
        .await
        .unwrap();

    let view = show_thread(store.db(), Some(&tracker), "t1", None).await.unwrap();
    let ids: Vec<&str> = view.emails.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["m1", "m2"]);
    assert_eq!(view.issue.unwrap().id, outcome.id);
    assert!(view.record.is_none());

    let err = show_thread(store.db(), None, "missing", None).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_inbox_filters_open_issues() {
    let store = TestStore::cross_reference().await.unwrap();
    let tracker = MockTracker::new();
    store
        .seed(&[
            email("m1", ALICE, "t1", "Mon, 2 Mar 2026 10:00:00 +0000"),
            email("m2", WORK, "t2", "Mon, 2 Mar 2026 11:00:00 +0000"),
            email("m3", WORK, "t3", "Mon, 2 Mar 2026 12:00:00 +0000"),
        ])
        .await
        .unwrap();
    triage_tracked(store.db(), &tracker, &request("t1", "high", "A")).await.unwrap();
    triage_tracked(store.db(), &tracker, &request("t2", "high", "B")).await.unwrap();
    let done = triage_tracked(store.db(), &tracker, &request("t3", "low", "C"))
        .await
        .unwrap();
    close_tracked(store.db(), &tracker, &[done.id], CLOSE_REASON_DONE)
        .await
        .unwrap();

    let open = inbox_tracked(&tracker, &labels(), 50, &InboxFilter::default())
        .await
        .unwrap();
    assert_eq!(open.len(), 2);

    let work = InboxFilter {
        account: Some("work".into()),
        all: true,
        ..Default::default()
    };
    assert_eq!(inbox_tracked(&tracker, &labels(), 50, &work).await.unwrap().len(), 2);

    let high_work = InboxFilter {
        priority: Some(Priority::High),
        account: Some("work".into()),
        all: true,
    };
    let found = inbox_tracked(&tracker, &labels(), 50, &high_work).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "B");
}

#[tokio::test]
async fn test_tracked_status_counts_and_next_up() {
    let store = TestStore::cross_reference().await.unwrap();
    let tracker = MockTracker::new();
    let mut seeded = Vec::new();
    for n in 1..=9 {
        seeded.push(email(
            &format!("m{n}"),
            ALICE,
            &format!("t{n}"),
            &format!("{n} Mar 2026 10:00:00 +0000"),
        ));
    }
    store.seed(&seeded).await.unwrap();

    let priorities = ["high", "high", "medium", "medium", "low", "low", "spam", "medium"];
    let mut ids = Vec::new();
    for (n, priority) in priorities.iter().enumerate() {
        let thread = format!("t{}", n + 1);
        let outcome = triage_tracked(store.db(), &tracker, &request(&thread, priority, &format!("act {thread}")))
            .await
            .unwrap();
        ids.push(outcome.id);
    }
    close_tracked(store.db(), &tracker, &ids[7..8], CLOSE_REASON_DONE)
        .await
        .unwrap();
    close_tracked(store.db(), &tracker, &ids[6..7], CLOSE_REASON_DISMISSED)
        .await
        .unwrap();

    let labels = labels();
    let source = TriageSource::Tracker {
        tracker: &tracker,
        labels: &labels,
    };
    let report = status(store.db(), source, true).await.unwrap();

    assert_eq!(report.summary.total_emails, 9);
    assert_eq!(report.summary.untriaged, 1);
    assert_eq!(report.summary.pending, 6);
    assert_eq!(report.summary.done, 1);
    assert_eq!(report.summary.dismissed, 1);
    assert_eq!(report.summary.priority[&Priority::High], 2);
    assert_eq!(report.summary.priority[&Priority::Spam], 0);
    assert_eq!(report.summary.ready, 6);
    assert_eq!(report.high_priority.len(), 2);
    assert_eq!(report.high_priority[0].subject, "subject t1");
    assert_eq!(report.action_items.len(), 5);

    let next = report.next_up().unwrap();
    assert_eq!(next.items.len(), 3);
    assert_eq!(next.more, 1);

    let counts = stats(store.db(), source).await.unwrap();
    assert_eq!(counts.triaged, 6);
    assert_eq!(counts.tracker_open, Some(6));
    assert_eq!(counts.emails[ALICE].count, 9);
}

#[tokio::test]
async fn test_tracked_status_degrades_when_tracker_missing() {
    let store = TestStore::cross_reference().await.unwrap();
    store
        .seed(&[email("m1", ALICE, "t1", "Mon, 2 Mar 2026 10:00:00 +0000")])
        .await
        .unwrap();
    let tracker = MockTracker::new();
    tracker.set_available(false).await;
    let labels = labels();

    let report = status(
        store.db(),
        TriageSource::Tracker {
            tracker: &tracker,
            labels: &labels,
        },
        true,
    )
    .await
    .unwrap();
    assert_eq!(report.summary.pending, 0);
    assert_eq!(report.summary.untriaged, 1);
    assert!(report.next_up().is_none());
}

#[tokio::test]
async fn test_local_status_uses_ledger() {
    let store = TestStore::self_contained().await.unwrap();
    store
        .seed(&[
            email("m1", ALICE, "t1", "Mon, 2 Mar 2026 10:00:00 +0000"),
            email("m2", ALICE, "t2", "Mon, 2 Mar 2026 11:00:00 +0000"),
            email("m3", ALICE, "t3", "Mon, 2 Mar 2026 12:00:00 +0000"),
        ])
        .await
        .unwrap();
    triage_local(store.db(), &request("t1", "high", "A")).await.unwrap();
    let low = triage_local(store.db(), &request("t2", "low", "B")).await.unwrap();
    close_local(store.db(), &[low.id], Status::Done).await.unwrap();

    let report = status(store.db(), TriageSource::Ledger, true).await.unwrap();
    assert_eq!(report.summary.pending, 1);
    assert_eq!(report.summary.done, 1);
    assert_eq!(report.summary.untriaged, 1);
    assert_eq!(report.high_priority.len(), 1);
    assert_eq!(report.summary.ready, 1);
    // The only ready item is already listed as high priority.
    assert!(report.next_up().is_none());

    let counts = stats(store.db(), TriageSource::Ledger).await.unwrap();
    assert_eq!(counts.triaged, 2);
    assert!(counts.tracker_open.is_none());
    assert_eq!(emails::count_all(store.db()).await.unwrap(), 3);
}
