// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only summaries: `mb stats` and `mb status`.

use std::collections::BTreeMap;

use mailbeads_core::{Issue, IssueTracker, MailbeadsError, Priority, Status, TriageRecord};
use mailbeads_storage::Database;
use mailbeads_storage::queries::{emails, ledger, refs, threads};
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::warn;

/// Most ready items listed under "Next Up".
pub const ACTION_ITEM_CAP: usize = 5;

const DISMISSED_PREFIX: &str = "dismissed";

/// Which triage generation backs the summary.
#[derive(Clone, Copy)]
pub enum TriageSource<'a> {
    /// Self-contained ledger.
    Ledger,
    /// Tracker issues carrying `labels`.
    Tracker {
        tracker: &'a dyn IssueTracker,
        labels: &'a [String],
    },
}

/// Message count and last fetch time for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSyncState {
    pub account: String,
    pub emails: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<String>,
}

/// Per-account sync state in account order.
pub async fn sync_state(db: &Database) -> Result<Vec<AccountSyncState>, MailbeadsError> {
    let mut states = Vec::new();
    for account in emails::distinct_accounts(db).await? {
        states.push(AccountSyncState {
            emails: emails::count_by_account(db, &account).await?,
            last_sync: emails::latest_fetched_at(db, &account).await?,
            account,
        });
    }
    Ok(states)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountStats {
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<String>,
}

/// Output of `mb stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub emails: BTreeMap<String, AccountStats>,
    pub untriaged: i64,
    pub triaged: i64,
    pub total_emails: i64,
    pub threads: i64,
    /// Open tracker issues, when a tracker answered.
    #[serde(rename = "beads_open", skip_serializing_if = "Option::is_none")]
    pub tracker_open: Option<usize>,
}

pub async fn stats(db: &Database, source: TriageSource<'_>) -> Result<Stats, MailbeadsError> {
    let mut per_account = BTreeMap::new();
    let mut total_emails = 0;
    for state in sync_state(db).await? {
        total_emails += state.emails;
        per_account.insert(
            state.account,
            AccountStats {
                count: state.emails,
                last_sync: state.last_sync,
            },
        );
    }

    let (triaged, tracker_open) = match source {
        TriageSource::Ledger => (ledger::count(db).await?, None),
        TriageSource::Tracker { tracker, labels } => {
            let open = if tracker.is_available().await {
                match tracker.list(labels, Some("open"), 0).await {
                    Ok(issues) => Some(issues.len()),
                    Err(e) => {
                        warn!(error = %e, "could not count open issues");
                        None
                    }
                }
            } else {
                None
            };
            (refs::count_refs(db).await?, open)
        }
    };

    Ok(Stats {
        emails: per_account,
        untriaged: threads::untriaged_count(db).await?,
        triaged,
        total_emails,
        threads: emails::distinct_thread_count(db).await?,
        tracker_open,
    })
}

/// A triage item as listed by `mb status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusItem {
    pub id: String,
    pub thread_id: String,
    pub priority: Priority,
    pub account: String,
    pub subject: String,
    pub action: String,
    #[serde(rename = "from_addr", skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl From<&TriageRecord> for StatusItem {
    fn from(record: &TriageRecord) -> Self {
        Self {
            id: record.id.clone(),
            thread_id: record.thread_id.clone(),
            priority: record.priority,
            account: record.account.clone(),
            subject: record.subject.clone(),
            action: record.action.clone(),
            from: record.from.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total_emails: i64,
    pub threads: i64,
    pub untriaged: i64,
    pub pending: i64,
    pub done: i64,
    pub dismissed: i64,
    /// Pending items by priority; every priority is present.
    pub priority: BTreeMap<Priority, i64>,
    pub ready: usize,
}

/// Output of `mb status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub summary: StatusSummary,
    /// Every pending high-priority item, in list order.
    pub high_priority: Vec<StatusItem>,
    /// The first [`ACTION_ITEM_CAP`] non-spam ready items.
    pub action_items: Vec<StatusItem>,
    pub sync_state: Vec<AccountSyncState>,
    #[serde(skip)]
    pub include_ready: bool,
}

/// The "Next Up" section of a status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextUp<'a> {
    /// Action items not already shown as high priority.
    pub items: Vec<&'a StatusItem>,
    /// Ready items shown in neither section.
    pub more: usize,
}

impl StatusReport {
    /// Items for "Next Up", or `None` when the section is omitted.
    ///
    /// High items already listed are skipped. The section is omitted when
    /// every action item is high priority and the high list is not empty.
    pub fn next_up(&self) -> Option<NextUp<'_>> {
        if !self.include_ready || self.action_items.is_empty() {
            return None;
        }
        let items: Vec<&StatusItem> = self
            .action_items
            .iter()
            .filter(|item| item.priority != Priority::High)
            .collect();
        if items.is_empty() && !self.high_priority.is_empty() {
            return None;
        }
        let more = self
            .summary
            .ready
            .saturating_sub(self.high_priority.len() + items.len());
        Some(NextUp { items, more })
    }
}

fn zeroed_priorities() -> BTreeMap<Priority, i64> {
    Priority::iter().map(|p| (p, 0)).collect()
}

fn first_action_items(items: impl IntoIterator<Item = StatusItem>) -> Vec<StatusItem> {
    items
        .into_iter()
        .filter(|item| item.priority != Priority::Spam)
        .take(ACTION_ITEM_CAP)
        .collect()
}

/// Build the status report.
///
/// Tracker failures degrade to zero counts with a warning.
pub async fn status(
    db: &Database,
    source: TriageSource<'_>,
    include_ready: bool,
) -> Result<StatusReport, MailbeadsError> {
    let sync_state = sync_state(db).await?;
    let total_emails = sync_state.iter().map(|s| s.emails).sum();
    let threads_total = emails::distinct_thread_count(db).await?;
    let untriaged = threads::untriaged_count(db).await?;

    let counts = match source {
        TriageSource::Ledger => ledger_counts(db, include_ready).await?,
        TriageSource::Tracker { tracker, labels } => {
            tracker_counts(db, tracker, labels, include_ready).await
        }
    };

    Ok(StatusReport {
        summary: StatusSummary {
            total_emails,
            threads: threads_total,
            untriaged,
            pending: counts.pending,
            done: counts.done,
            dismissed: counts.dismissed,
            priority: counts.priority,
            ready: counts.ready,
        },
        high_priority: counts.high,
        action_items: counts.actions,
        sync_state,
        include_ready,
    })
}

struct Counts {
    pending: i64,
    done: i64,
    dismissed: i64,
    priority: BTreeMap<Priority, i64>,
    ready: usize,
    high: Vec<StatusItem>,
    actions: Vec<StatusItem>,
}

impl Counts {
    fn empty() -> Self {
        Self {
            pending: 0,
            done: 0,
            dismissed: 0,
            priority: zeroed_priorities(),
            ready: 0,
            high: Vec::new(),
            actions: Vec::new(),
        }
    }
}

async fn ledger_counts(db: &Database, include_ready: bool) -> Result<Counts, MailbeadsError> {
    let by_status = ledger::count_by_status(db).await?;
    let count = |s: Status| by_status.get(&s).copied().unwrap_or(0);
    let high = ledger::list(db, Some(Status::Pending), None, false)
        .await?
        .iter()
        .filter(|r| r.priority == Priority::High)
        .map(StatusItem::from)
        .collect();

    let (ready, actions) = if include_ready {
        let ready = ledger::ready(db, None).await?;
        (ready.len(), first_action_items(ready.iter().map(StatusItem::from)))
    } else {
        (0, Vec::new())
    };

    Ok(Counts {
        pending: count(Status::Pending),
        done: count(Status::Done),
        dismissed: count(Status::Dismissed),
        priority: ledger::count_by_priority(db).await?,
        ready,
        high,
        actions,
    })
}

/// Describe a tracker issue, taking the subject from the local thread when
/// the issue names one.
async fn issue_item(db: &Database, issue: &Issue) -> StatusItem {
    let thread_id = issue.thread_id().unwrap_or_default().to_string();
    let account = issue.account().unwrap_or_default().to_string();
    let thread = if thread_id.is_empty() || account.is_empty() {
        None
    } else {
        threads::thread_info(db, &thread_id, &account).await.ok()
    };
    StatusItem {
        id: issue.id.clone(),
        priority: issue.mb_priority(),
        subject: thread
            .as_ref()
            .map(|t| t.subject.clone())
            .unwrap_or_else(|| issue.title.clone()),
        from: thread.map(|t| t.from).filter(|f| !f.is_empty()),
        action: issue.title.clone(),
        thread_id,
        account,
    }
}

async fn tracker_counts(
    db: &Database,
    tracker: &dyn IssueTracker,
    labels: &[String],
    include_ready: bool,
) -> Counts {
    let mut counts = Counts::empty();
    if !tracker.is_available().await {
        warn!("issue tracker unavailable, triage counts omitted");
        return counts;
    }

    match tracker.list(labels, Some("open"), 0).await {
        Ok(open) => {
            counts.pending = open.len() as i64;
            for issue in &open {
                *counts.priority.entry(issue.mb_priority()).or_insert(0) += 1;
                if issue.mb_priority() == Priority::High {
                    counts.high.push(issue_item(db, issue).await);
                }
            }
        }
        Err(e) => warn!(error = %e, "could not list open issues"),
    }

    match tracker.list(labels, Some("closed"), 0).await {
        Ok(closed) => {
            for issue in &closed {
                // Anything not dismissed counts as done, including a bare close.
                if issue
                    .close_reason
                    .as_deref()
                    .is_some_and(|reason| reason.starts_with(DISMISSED_PREFIX))
                {
                    counts.dismissed += 1;
                } else {
                    counts.done += 1;
                }
            }
        }
        Err(e) => warn!(error = %e, "could not list closed issues"),
    }

    if include_ready {
        match tracker.ready(labels, 0).await {
            Ok(ready) => {
                counts.ready = ready.len();
                let mut items = Vec::new();
                for issue in ready.iter().filter(|i| i.mb_priority() != Priority::Spam) {
                    if items.len() >= ACTION_ITEM_CAP {
                        break;
                    }
                    items.push(issue_item(db, issue).await);
                }
                counts.actions = items;
            }
            Err(e) => warn!(error = %e, "could not list ready issues"),
        }
    }
    counts
}
