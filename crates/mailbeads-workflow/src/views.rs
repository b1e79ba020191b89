// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Listing and inspection queries behind `inbox`, `ready`, and `show`.

use mailbeads_core::{
    Email, Issue, IssueTracker, MailbeadsError, Priority, TriageRecord, TriageRef,
};
use mailbeads_storage::queries::{emails, ledger, refs};
use mailbeads_storage::{Database, SchemaGeneration};
use serde::Serialize;
use tracing::{debug, warn};

/// A thread with every stored message and whatever triage state exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadView {
    pub thread_id: String,
    pub account: String,
    pub subject: String,
    /// Messages oldest first.
    pub emails: Vec<Email>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triage_ref: Option<TriageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<Issue>,
    #[serde(rename = "triage", skip_serializing_if = "Option::is_none")]
    pub record: Option<TriageRecord>,
}

/// Load a thread for display.
///
/// The linked issue is fetched only when a tracker is given and reachable;
/// tracker errors leave `issue` empty.
pub async fn show_thread(
    db: &Database,
    tracker: Option<&dyn IssueTracker>,
    thread_id: &str,
    account: Option<&str>,
) -> Result<ThreadView, MailbeadsError> {
    let account = emails::resolve_account(db, thread_id, account).await?;
    let messages = emails::thread_messages(db, thread_id, &account).await?;
    let Some(first) = messages.first() else {
        return Err(MailbeadsError::not_found("thread", thread_id));
    };
    let subject = first.subject.clone();

    let mut view = ThreadView {
        thread_id: thread_id.to_string(),
        account: account.clone(),
        subject,
        emails: Vec::new(),
        triage_ref: None,
        issue: None,
        record: None,
    };

    match db.generation() {
        SchemaGeneration::SelfContained => {
            view.record = ledger::get(db, thread_id, &account).await?;
        }
        SchemaGeneration::CrossReference => {
            view.triage_ref = refs::get_ref(db, thread_id, &account).await?;
            if let (Some(triage_ref), Some(tracker)) = (&view.triage_ref, tracker)
                && !triage_ref.is_placeholder()
                && tracker.is_available().await
            {
                view.issue = match tracker.show(&triage_ref.external_id).await {
                    Ok(issue) => issue,
                    Err(e) => {
                        warn!(issue = %triage_ref.external_id, error = %e, "could not load issue");
                        None
                    }
                };
            }
        }
    }

    view.emails = messages;
    Ok(view)
}

/// Filters for `mb inbox`.
#[derive(Debug, Clone, Default)]
pub struct InboxFilter {
    pub priority: Option<Priority>,
    /// Account substring.
    pub account: Option<String>,
    /// Include closed items.
    pub all: bool,
}

impl InboxFilter {
    fn account(&self) -> Option<&str> {
        self.account.as_deref().filter(|a| !a.is_empty())
    }

    fn keeps_issue(&self, issue: &Issue) -> bool {
        if self.priority.is_some_and(|p| issue.mb_priority() != p) {
            return false;
        }
        match self.account() {
            Some(needle) => issue.account().is_some_and(|a| a.contains(needle)),
            None => true,
        }
    }
}

/// Triaged tracker issues, open only unless `filter.all`.
pub async fn inbox_tracked(
    tracker: &dyn IssueTracker,
    labels: &[String],
    limit: u32,
    filter: &InboxFilter,
) -> Result<Vec<Issue>, MailbeadsError> {
    let status = if filter.all { None } else { Some("open") };
    let issues = tracker.list(labels, status, limit).await?;
    let total = issues.len();
    let kept: Vec<Issue> = issues
        .into_iter()
        .filter(|issue| filter.keeps_issue(issue))
        .collect();
    debug!(total, kept = kept.len(), "inbox filtered");
    Ok(kept)
}

/// Ledger records, pending only unless `filter.all`.
pub async fn inbox_local(
    db: &Database,
    filter: &InboxFilter,
) -> Result<Vec<TriageRecord>, MailbeadsError> {
    let records = ledger::list(db, None, filter.account(), filter.all).await?;
    Ok(match filter.priority {
        Some(priority) => records
            .into_iter()
            .filter(|r| r.priority == priority)
            .collect(),
        None => records,
    })
}

/// Unblocked open tracker issues, optionally narrowed by account substring.
pub async fn ready_tracked(
    tracker: &dyn IssueTracker,
    labels: &[String],
    limit: u32,
    account: Option<&str>,
) -> Result<Vec<Issue>, MailbeadsError> {
    let filter = InboxFilter {
        account: account.map(str::to_string),
        ..Default::default()
    };
    Ok(tracker
        .ready(labels, limit)
        .await?
        .into_iter()
        .filter(|issue| filter.keeps_issue(issue))
        .collect())
}

/// Actionable ledger records.
pub async fn ready_local(
    db: &Database,
    account: Option<&str>,
) -> Result<Vec<TriageRecord>, MailbeadsError> {
    ledger::ready(db, account).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(priority: i64, notes: &str) -> Issue {
        Issue {
            id: "bd-1".into(),
            status: "open".into(),
            priority,
            notes: Some(notes.into()),
            ..Default::default()
        }
    }

    #[test]
    fn filter_by_priority_and_account_substring() {
        let filter = InboxFilter {
            priority: Some(Priority::High),
            account: Some("work".into()),
            all: false,
        };
        assert!(filter.keeps_issue(&issue(1, "from=a@x.com account=me@work.com thread=t1")));
        assert!(filter.keeps_issue(&issue(0, "account=me@work.com")));
        assert!(!filter.keeps_issue(&issue(2, "account=me@work.com")));
        assert!(!filter.keeps_issue(&issue(1, "account=me@home.com")));
        assert!(!filter.keeps_issue(&issue(1, "no account token")));
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let filter = InboxFilter {
            account: Some(String::new()),
            ..Default::default()
        };
        assert!(filter.keeps_issue(&issue(4, "")));
    }
}
