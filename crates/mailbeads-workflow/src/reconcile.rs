// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repair passes between local refs and the tracker.
//!
//! [`migrate_legacy`] turns placeholder refs into real issues.
//! [`reconcile_refs`] re-derives refs from the tracker's own records: it
//! drops refs whose issue is gone or closed and restores refs for open
//! issues whose local write never happened. Both are safe to re-run.

use mailbeads_core::{IssueTracker, MailbeadsError, NewIssue, Priority, TriageRef};
use mailbeads_storage::Database;
use mailbeads_storage::queries::{refs, threads};
use serde::Serialize;
use tracing::{info, warn};

use crate::require_tracker;
use crate::triage::issue_notes;

/// Line appended to the notes of issues created for placeholder refs.
pub const MIGRATED_NOTE: &str = "Migrated from legacy mailbeads triage.";

/// One placeholder ref handled by [`migrate_legacy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigratedRef {
    pub thread_id: String,
    pub account: String,
    pub subject: String,
    /// The placeholder being replaced.
    pub placeholder: String,
    /// New issue ID; `None` in a dry run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

/// A ref listed in a report, with the reason it was listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefEntry {
    pub thread_id: String,
    pub account: String,
    pub external_id: String,
    pub reason: String,
}

impl RefEntry {
    fn new(triage_ref: &TriageRef, reason: impl Into<String>) -> Self {
        Self {
            thread_id: triage_ref.thread_id.clone(),
            account: triage_ref.account.clone(),
            external_id: triage_ref.external_id.clone(),
            reason: reason.into(),
        }
    }
}

/// Outcome of [`migrate_legacy`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub found: usize,
    pub dry_run: bool,
    pub migrated: Vec<MigratedRef>,
    pub skipped: Vec<RefEntry>,
}

/// Create a tracker issue for every placeholder ref and repoint the ref.
///
/// Missing threads and per-item failures are reported and skipped.
pub async fn migrate_legacy(
    db: &Database,
    tracker: &dyn IssueTracker,
    dry_run: bool,
) -> Result<MigrationReport, MailbeadsError> {
    require_tracker(tracker).await?;
    let legacy = refs::legacy_refs(db).await?;
    let mut report = MigrationReport {
        found: legacy.len(),
        dry_run,
        ..Default::default()
    };

    for triage_ref in &legacy {
        let thread = match threads::thread_info(db, &triage_ref.thread_id, &triage_ref.account).await {
            Ok(thread) => thread,
            Err(e) if e.is_not_found() => {
                warn!(thread_id = %triage_ref.thread_id, account = %triage_ref.account, "thread not found, skipping");
                report
                    .skipped
                    .push(RefEntry::new(triage_ref, "thread not found"));
                continue;
            }
            Err(e) => return Err(e),
        };

        let mut item = MigratedRef {
            thread_id: thread.thread_id.clone(),
            account: thread.account.clone(),
            subject: thread.subject.clone(),
            placeholder: triage_ref.external_id.clone(),
            external_id: None,
        };
        if dry_run {
            report.migrated.push(item);
            continue;
        }

        let notes = issue_notes(
            &thread.from,
            &thread.account,
            &thread.thread_id,
            thread.email_count,
            Some(MIGRATED_NOTE),
        );
        let issue = match tracker
            .create(&NewIssue {
                title: thread.subject.clone(),
                notes: Some(notes),
                priority: Priority::Medium,
                thread_id: thread.thread_id.clone(),
                ..Default::default()
            })
            .await
        {
            Ok(issue) => issue,
            Err(e) => {
                warn!(thread_id = %thread.thread_id, error = %e, "issue create failed");
                report.skipped.push(RefEntry::new(triage_ref, e.to_string()));
                continue;
            }
        };

        if let Err(e) =
            refs::upsert_ref(db, &thread.thread_id, &thread.account, &issue.id).await
        {
            warn!(thread_id = %thread.thread_id, issue = %issue.id, error = %e, "ref update failed");
            report.skipped.push(RefEntry::new(triage_ref, e.to_string()));
            continue;
        }
        info!(thread_id = %thread.thread_id, issue = %issue.id, "legacy ref migrated");
        item.external_id = Some(issue.id);
        report.migrated.push(item);
    }
    Ok(report)
}

/// Outcome of [`reconcile_refs`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub dry_run: bool,
    /// Refs dropped because their issue is missing or closed.
    pub removed: Vec<RefEntry>,
    /// Refs written for open issues that had none locally.
    pub restored: Vec<TriageRef>,
    /// Refs checked and found consistent.
    pub unchanged: usize,
    /// Refs the tracker could not answer for.
    pub errors: Vec<RefEntry>,
}

/// Sweep refs against the tracker.
///
/// Placeholder refs are left to [`migrate_legacy`]. Open issues are matched
/// by their `mb:<thread>` external reference and the `account=` note.
pub async fn reconcile_refs(
    db: &Database,
    tracker: &dyn IssueTracker,
    labels: &[String],
    dry_run: bool,
) -> Result<ReconcileReport, MailbeadsError> {
    require_tracker(tracker).await?;
    let mut report = ReconcileReport {
        dry_run,
        ..Default::default()
    };

    for triage_ref in refs::list_refs(db).await? {
        if triage_ref.is_placeholder() {
            continue;
        }
        let reason = match tracker.show(&triage_ref.external_id).await {
            Ok(None) => "issue not found",
            Ok(Some(issue)) if issue.is_closed() => "issue closed",
            Ok(Some(_)) => {
                report.unchanged += 1;
                continue;
            }
            Err(e) => {
                warn!(issue = %triage_ref.external_id, error = %e, "could not check issue");
                report.errors.push(RefEntry::new(&triage_ref, e.to_string()));
                continue;
            }
        };
        if !dry_run {
            refs::delete_ref(db, &triage_ref.external_id).await?;
            info!(issue = %triage_ref.external_id, reason, "stale ref removed");
        }
        report.removed.push(RefEntry::new(&triage_ref, reason));
    }

    for issue in tracker.list(labels, Some("open"), 0).await? {
        let (Some(thread_id), Some(account)) = (issue.thread_id(), issue.account()) else {
            continue;
        };
        if refs::get_ref(db, thread_id, account).await?.is_some()
            || refs::get_ref_by_external_id(db, &issue.id).await?.is_some()
        {
            continue;
        }
        match threads::thread_info(db, thread_id, account).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e),
        }
        if !dry_run {
            refs::upsert_ref(db, thread_id, account, &issue.id).await?;
            info!(issue = %issue.id, thread_id, "ref restored");
        }
        report.restored.push(
            refs::get_ref(db, thread_id, account)
                .await?
                .unwrap_or_else(|| TriageRef {
                    thread_id: thread_id.to_string(),
                    account: account.to_string(),
                    external_id: issue.id.clone(),
                    created_at: String::new(),
                }),
        );
    }
    Ok(report)
}
