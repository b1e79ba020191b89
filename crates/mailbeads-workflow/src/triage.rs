// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording and closing triage decisions.
//!
//! In cross-reference mode a decision is two independent steps: write the
//! tracker issue, then write the local ref. Each step is idempotent on its
//! own, and [`crate::reconcile`] repairs a run interrupted between them.

use std::collections::BTreeMap;

use mailbeads_core::{
    IssueTracker, MailbeadsError, NewIssue, Priority, Status, Thread, TriageDecision,
};
use mailbeads_storage::Database;
use mailbeads_storage::queries::{emails, ledger, refs, threads};
use serde::Serialize;
use tracing::{info, warn};

use crate::require_tracker;

/// A triage call as supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct TriageRequest {
    pub thread_id: String,
    pub account: Option<String>,
    /// Raw priority text; `None` or empty means medium.
    pub priority: Option<String>,
    pub action: String,
    pub suggestion: Option<String>,
    pub agent_notes: Option<String>,
    pub category: Option<String>,
    /// Sender override; defaults to the thread's sender.
    pub from: Option<String>,
    /// Issue or record this decision depends on.
    pub depends_on: Option<String>,
}

impl TriageRequest {
    /// Check the request before anything is written.
    pub fn validate(&self) -> Result<Priority, MailbeadsError> {
        if self.action.trim().is_empty() {
            return Err(MailbeadsError::Validation("--action is required".to_string()));
        }
        match non_empty(&self.priority) {
            Some(raw) => Priority::parse(raw),
            None => Ok(Priority::Medium),
        }
    }

    fn sender(&self, thread: &Thread) -> String {
        non_empty(&self.from)
            .map(str::to_string)
            .unwrap_or_else(|| thread.from.clone())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Result of a triage call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriageOutcome {
    pub thread_id: String,
    pub account: String,
    /// Tracker issue ID or local record ID.
    pub id: String,
    pub action: String,
    pub priority: Priority,
    pub subject: String,
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
}

/// Notes written on a tracker issue for a thread.
pub fn issue_notes(
    from: &str,
    account: &str,
    thread_id: &str,
    email_count: i64,
    extra: Option<&str>,
) -> String {
    let mut notes = format!("from={from} account={account} thread={thread_id} emails={email_count}");
    if let Some(extra) = extra.filter(|e| !e.is_empty()) {
        notes.push_str("\n\n");
        notes.push_str(extra);
    }
    notes
}

/// Resolve the account and load the thread snapshot.
async fn resolve_thread(db: &Database, request: &TriageRequest) -> Result<Thread, MailbeadsError> {
    let account =
        emails::resolve_account(db, &request.thread_id, request.account.as_deref()).await?;
    threads::thread_info(db, &request.thread_id, &account).await
}

/// Record a decision as a tracker issue plus a local ref.
///
/// An existing real ref updates the issue in place. A missing ref, or a
/// placeholder left by migration, creates a fresh issue and points the ref
/// at it.
pub async fn triage_tracked(
    db: &Database,
    tracker: &dyn IssueTracker,
    request: &TriageRequest,
) -> Result<TriageOutcome, MailbeadsError> {
    let priority = request.validate()?;
    require_tracker(tracker).await?;
    let thread = resolve_thread(db, request).await?;
    let (thread_id, account) = (&thread.thread_id, &thread.account);

    let existing = refs::get_ref(db, thread_id, account)
        .await?
        .filter(|r| !r.is_placeholder());

    let (id, created) = match existing {
        Some(triage_ref) => {
            let mut fields = BTreeMap::from([
                ("title".to_string(), request.action.clone()),
                ("priority".to_string(), priority.tracker_level().to_string()),
            ]);
            if let Some(suggestion) = non_empty(&request.suggestion) {
                fields.insert("description".to_string(), suggestion.to_string());
            }
            tracker.update(&triage_ref.external_id, &fields).await?;
            (triage_ref.external_id, false)
        }
        None => {
            let notes = issue_notes(
                &request.sender(&thread),
                account,
                thread_id,
                thread.email_count,
                non_empty(&request.agent_notes),
            );
            let issue = tracker
                .create(&NewIssue {
                    title: request.action.clone(),
                    description: non_empty(&request.suggestion).map(str::to_string),
                    notes: Some(notes),
                    priority,
                    category: non_empty(&request.category).map(str::to_string),
                    parent: non_empty(&request.depends_on).map(str::to_string),
                    labels: Vec::new(),
                    thread_id: thread_id.clone(),
                })
                .await?;
            if let Err(e) = refs::upsert_ref(db, thread_id, account, &issue.id).await {
                warn!(
                    issue = %issue.id,
                    error = %e,
                    "issue created but local ref not saved; `mb reconcile` restores it"
                );
                return Err(e);
            }
            (issue.id, true)
        }
    };

    if !created && let Some(parent) = non_empty(&request.depends_on) {
        if let Err(e) = tracker.add_dependency(&id, parent).await {
            warn!(issue = %id, parent, error = %e, "could not link dependency");
        }
    }

    info!(issue = %id, %priority, created, "thread triaged");
    Ok(TriageOutcome {
        thread_id: thread_id.clone(),
        account: account.clone(),
        id,
        action: request.action.clone(),
        priority,
        subject: thread.subject.clone(),
        created,
        depends_on: non_empty(&request.depends_on).map(str::to_string),
    })
}

/// Record a decision in the local ledger.
///
/// A dependency is resolved (by ID prefix) before anything is written.
pub async fn triage_local(
    db: &Database,
    request: &TriageRequest,
) -> Result<TriageOutcome, MailbeadsError> {
    let priority = request.validate()?;
    let thread = resolve_thread(db, request).await?;
    let blocker = match non_empty(&request.depends_on) {
        Some(dep) => Some(ledger::get_by_id(db, dep).await?),
        None => None,
    };
    if blocker
        .as_ref()
        .is_some_and(|b| b.thread_id == thread.thread_id && b.account == thread.account)
    {
        return Err(MailbeadsError::Validation(
            "a triage record cannot depend on itself".to_string(),
        ));
    }

    let mut decision = TriageDecision::for_thread(&thread, priority, request.action.clone());
    decision.from = Some(request.sender(&thread)).filter(|f| !f.is_empty());
    decision.suggestion = non_empty(&request.suggestion).map(str::to_string);
    decision.agent_notes = non_empty(&request.agent_notes).map(str::to_string);
    decision.category = non_empty(&request.category).map(str::to_string);

    let upserted = ledger::upsert(db, &decision).await?;
    if let Some(blocker) = &blocker {
        ledger::add_dependency(db, &upserted.id, &blocker.id).await?;
    }

    info!(id = %upserted.id, %priority, created = upserted.created, "thread triaged");
    Ok(TriageOutcome {
        thread_id: thread.thread_id,
        account: thread.account,
        id: upserted.id,
        action: request.action.clone(),
        priority,
        subject: thread.subject,
        created: upserted.created,
        depends_on: blocker.map(|b| b.id),
    })
}

/// Result of closing one ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloseOutcome {
    /// The ID as supplied.
    pub id: String,
    /// Resolved record ID when a prefix was expanded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
    pub closed: bool,
    /// Whether a local ref was removed (cross-reference mode).
    pub ref_removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CloseOutcome {
    fn failed(id: &str, error: &MailbeadsError) -> Self {
        Self {
            id: id.to_string(),
            resolved: None,
            closed: false,
            ref_removed: false,
            error: Some(error.to_string()),
        }
    }
}

/// Close tracker issues, then drop their local refs.
///
/// A failed close skips that ID and moves on. A failed ref delete after a
/// successful close is logged; the ref is left for `mb reconcile`.
pub async fn close_tracked(
    db: &Database,
    tracker: &dyn IssueTracker,
    ids: &[String],
    reason: &str,
) -> Result<Vec<CloseOutcome>, MailbeadsError> {
    require_tracker(tracker).await?;
    let mut outcomes = Vec::with_capacity(ids.len());
    for id in ids {
        if let Err(e) = tracker.close(id, reason).await {
            warn!(issue = %id, error = %e, "close failed");
            outcomes.push(CloseOutcome::failed(id, &e));
            continue;
        }
        let ref_removed = match refs::delete_ref(db, id).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(issue = %id, error = %e, "issue closed but local ref not removed");
                false
            }
        };
        info!(issue = %id, reason, "issue closed");
        outcomes.push(CloseOutcome {
            id: id.clone(),
            resolved: None,
            closed: true,
            ref_removed,
            error: None,
        });
    }
    Ok(outcomes)
}

/// Set the status of ledger records, resolving each ID by prefix.
pub async fn close_local(
    db: &Database,
    ids: &[String],
    status: Status,
) -> Result<Vec<CloseOutcome>, MailbeadsError> {
    let mut outcomes = Vec::with_capacity(ids.len());
    for id in ids {
        let record = match ledger::get_by_id(db, id).await {
            Ok(record) => record,
            Err(e) => {
                outcomes.push(CloseOutcome::failed(id, &e));
                continue;
            }
        };
        if let Err(e) = ledger::set_status(db, &record.id, status).await {
            outcomes.push(CloseOutcome::failed(id, &e));
            continue;
        }
        info!(id = %record.id, %status, "record closed");
        outcomes.push(CloseOutcome {
            id: id.clone(),
            resolved: Some(record.id).filter(|r| r != id),
            closed: true,
            ref_removed: false,
            error: None,
        });
    }
    Ok(outcomes)
}

/// Result of snoozing a ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnoozeOutcome {
    pub id: String,
    pub snoozed_until: String,
}

/// Snooze a ledger record (by ID prefix) until `until`.
pub async fn snooze_local(
    db: &Database,
    id: &str,
    until: &str,
) -> Result<SnoozeOutcome, MailbeadsError> {
    let record = ledger::get_by_id(db, id).await?;
    let snoozed_until = ledger::snooze(db, &record.id, until).await?;
    Ok(SnoozeOutcome {
        id: record.id,
        snoozed_until,
    })
}
