// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mailbox sync: fetch new messages per account and notify the tracker of
//! activity on already-triaged threads.

use mailbeads_config::model::SyncConfig;
use mailbeads_core::{
    Email, FullMessage, IssueTracker, MailProvider, MailbeadsError, MessageSummary, SyncResult,
    SyncSummary, clock,
};
use mailbeads_storage::Database;
use mailbeads_storage::queries::{emails, refs};
use tracing::{debug, info, warn};

/// Per-invocation sync switches.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Ignore the stored high-water mark and use the default window.
    pub full: bool,
    /// Sync only this account.
    pub account: Option<String>,
    /// Search all mail instead of the inbox.
    pub include_spam: bool,
}

/// Build the provider query for one account.
///
/// An incremental `after:` bound is derived from the newest stored message
/// date unless `full` is set or the date does not parse.
pub fn build_query(
    latest_date: Option<&str>,
    full: bool,
    default_window: &str,
    include_spam: bool,
) -> String {
    let incremental = if full {
        None
    } else {
        latest_date
            .and_then(clock::parse_any)
            .map(|at| format!("after:{}", at.format("%Y/%m/%d")))
    };
    let mut query = incremental.unwrap_or_else(|| default_window.to_string());
    if !include_spam {
        query.push_str(" in:inbox");
    }
    query
}

/// Convert a provider read into a stored message. Summary fields fill gaps
/// left by the full read.
pub fn to_email(
    account: &str,
    summary: &MessageSummary,
    full: FullMessage,
    fetched_at: &str,
) -> Email {
    let or_summary = |value: String, fallback: &str| {
        if value.is_empty() {
            fallback.to_string()
        } else {
            value
        }
    };
    let is_read = !full.labels.iter().any(|l| l == "UNREAD");
    let labels = Some(full.labels.join(",")).filter(|l| !l.is_empty());
    let snippet = if summary.snippet.is_empty() {
        full.snippet
    } else {
        summary.snippet.clone()
    };

    Email {
        id: or_summary(full.id, &summary.id),
        account: account.to_string(),
        thread_id: or_summary(full.thread_id, &summary.thread_id),
        message_id: full.message_id.filter(|m| !m.is_empty()),
        from: or_summary(full.from, &summary.from),
        to: Some(or_summary(full.to, &summary.to)).filter(|t| !t.is_empty()),
        cc: full.cc.filter(|c| !c.is_empty()),
        subject: or_summary(full.subject, &summary.subject),
        snippet: Some(snippet).filter(|s| !s.is_empty()),
        body: Some(full.body),
        date: or_summary(full.date, &summary.date),
        labels,
        is_read,
        fetched_at: fetched_at.to_string(),
    }
}

/// Sync every account (or the one named in `options`).
///
/// Provider failures are recorded per account and never abort the run.
/// When a tracker is given and reachable, threads with new mail get a
/// comment on their issue.
pub async fn sync(
    db: &Database,
    provider: &dyn MailProvider,
    tracker: Option<&dyn IssueTracker>,
    config: &SyncConfig,
    options: &SyncOptions,
) -> Result<SyncSummary, MailbeadsError> {
    let known = provider.accounts().await?;
    let accounts = match options.account.as_deref().filter(|a| !a.is_empty()) {
        Some(account) => vec![account.to_string()],
        None => known.clone(),
    };
    if accounts.is_empty() {
        return Err(MailbeadsError::Config(
            "no accounts found, add account directories with credentials.json to the project root"
                .to_string(),
        ));
    }

    let tracker = match tracker {
        Some(t) if t.is_available().await => Some(t),
        _ => None,
    };

    let mut summary = SyncSummary::default();
    for account in &accounts {
        let result = if known.contains(account) {
            sync_account(db, provider, tracker, config, options, account).await?
        } else {
            warn!(account = %account, "credentials not found, skipping");
            SyncResult {
                account: account.clone(),
                error: Some("credentials not found".to_string()),
                ..Default::default()
            }
        };
        summary.total_new += result.fetched;
        summary.accounts.push(result);
    }
    summary.total_in_db = emails::count_all(db).await?;
    info!(
        accounts = summary.accounts.len(),
        new = summary.total_new,
        total = summary.total_in_db,
        "sync complete"
    );
    Ok(summary)
}

/// Sync one account. Store failures propagate; provider failures are
/// captured in the result.
pub async fn sync_account(
    db: &Database,
    provider: &dyn MailProvider,
    tracker: Option<&dyn IssueTracker>,
    config: &SyncConfig,
    options: &SyncOptions,
    account: &str,
) -> Result<SyncResult, MailbeadsError> {
    let mut result = SyncResult {
        account: account.to_string(),
        ..Default::default()
    };

    let latest = emails::latest_date(db, account).await?;
    let query = build_query(
        latest.as_deref(),
        options.full,
        &config.default_window,
        options.include_spam || config.include_spam,
    );
    debug!(account, %query, "searching");

    let found = match provider.search(account, &query, config.max_results).await {
        Ok(found) => found,
        Err(e) => {
            warn!(account, error = %e, "search failed");
            result.error = Some(format!("search failed: {e}"));
            return Ok(result);
        }
    };

    let mut fresh = Vec::new();
    for summary in &found {
        if !emails::email_exists(db, &summary.id).await? {
            fresh.push(summary);
        }
    }
    result.skipped = found.len() - fresh.len();

    let fetched_at = clock::now();
    for summary in fresh {
        let full = match provider.read_full(account, &summary.id).await {
            Ok(full) => full,
            Err(e) => {
                warn!(account, id = %summary.id, error = %e, "failed to read message");
                continue;
            }
        };
        let email = to_email(account, summary, full, &fetched_at);
        if emails::insert_email(db, &email).await? {
            result.fetched += 1;
        }
    }

    info!(
        account,
        fetched = result.fetched,
        skipped = result.skipped,
        "account synced"
    );

    if result.fetched > 0
        && let Some(tracker) = tracker
    {
        result.commented = notify_new_mail(db, tracker).await;
    }
    Ok(result)
}

/// Comment text announcing new activity on a thread.
pub fn activity_comment(subject: &str, email_count: i64, from: &str) -> String {
    format!("New email activity on thread: {subject} ({email_count} emails, latest from {from})")
}

/// Comment on the issue of every triaged thread that received mail after
/// its ref was written, then refresh the ref so the mail is announced once.
///
/// Placeholder refs are skipped. Failures are logged and do not fail the
/// sync. Returns the number of issues commented on.
pub async fn notify_new_mail(db: &Database, tracker: &dyn IssueTracker) -> usize {
    let stale = match refs::threads_with_new_mail(db).await {
        Ok(stale) => stale,
        Err(e) => {
            warn!(error = %e, "could not compute threads with new mail");
            return 0;
        }
    };

    let mut commented = 0;
    for item in stale {
        let (thread, triage_ref) = (&item.thread, &item.triage_ref);
        if triage_ref.is_placeholder() {
            debug!(external_id = %triage_ref.external_id, "skipping placeholder ref");
            continue;
        }
        let text = activity_comment(&thread.subject, thread.email_count, &thread.from);
        if let Err(e) = tracker.comment(&triage_ref.external_id, &text).await {
            warn!(external_id = %triage_ref.external_id, error = %e, "comment failed");
            continue;
        }
        if let Err(e) = refs::upsert_ref(
            db,
            &triage_ref.thread_id,
            &triage_ref.account,
            &triage_ref.external_id,
        )
        .await
        {
            warn!(external_id = %triage_ref.external_id, error = %e, "could not refresh ref");
        }
        info!(external_id = %triage_ref.external_id, subject = %thread.subject, "notified of new mail");
        commented += 1;
    }
    commented
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incremental_query_from_rfc2822_date() {
        let q = build_query(
            Some("Tue, 3 Mar 2026 09:00:00 +0000"),
            false,
            "newer_than:3d",
            false,
        );
        assert_eq!(q, "after:2026/03/03 in:inbox");
    }

    #[test]
    fn full_or_unparseable_uses_window() {
        assert_eq!(
            build_query(Some("2026-03-03T09:00:00Z"), true, "newer_than:3d", false),
            "newer_than:3d in:inbox"
        );
        assert_eq!(
            build_query(Some("garbage"), false, "newer_than:7d", true),
            "newer_than:7d"
        );
        assert_eq!(build_query(None, false, "newer_than:3d", true), "newer_than:3d");
    }

    #[test]
    fn unread_label_and_fallbacks() {
        let summary = MessageSummary {
            id: "m1".into(),
            thread_id: "t1".into(),
            from: "summary@x.com".into(),
            to: "me@x.com".into(),
            subject: "From summary".into(),
            date: "Mon, 2 Mar 2026 10:00:00 +0000".into(),
            snippet: "short".into(),
        };
        let full = FullMessage {
            id: "m1".into(),
            thread_id: "t1".into(),
            body: "text".into(),
            labels: vec!["INBOX".into(), "UNREAD".into()],
            ..Default::default()
        };
        let email = to_email("me@x.com", &summary, full, "2026-03-02T10:05:00Z");
        assert!(!email.is_read);
        assert_eq!(email.from, "summary@x.com");
        assert_eq!(email.subject, "From summary");
        assert_eq!(email.date, "Mon, 2 Mar 2026 10:00:00 +0000");
        assert_eq!(email.labels.as_deref(), Some("INBOX,UNREAD"));
        assert_eq!(email.snippet.as_deref(), Some("short"));
        assert_eq!(email.fetched_at, "2026-03-02T10:05:00Z");
    }

    #[test]
    fn comment_text() {
        assert_eq!(
            activity_comment("Budget", 3, "bob@x.com"),
            "New email activity on thread: Budget (3 emails, latest from bob@x.com)"
        );
    }
}
