// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mb untriaged`, `mb inbox`, `mb ready`, and `mb show`.

use std::process::ExitCode;

use mailbeads_core::{Issue, IssueTracker, MailbeadsError, Priority, Thread, TriageRecord};
use mailbeads_storage::SchemaGeneration;
use mailbeads_storage::queries::threads;
use mailbeads_workflow::require_tracker;
use mailbeads_workflow::views::{self, InboxFilter, ThreadView};

use crate::context::CommandContext;
use crate::display::{Style, account_label, connector, email_tree, time_ago, truncate};

pub async fn untriaged(
    ctx: &CommandContext,
    account: Option<&str>,
    limit: usize,
) -> Result<ExitCode, MailbeadsError> {
    let limit = (limit > 0).then_some(limit);
    let found = threads::untriaged_threads(ctx.db()?, account, limit).await?;

    if ctx.out.json {
        ctx.out.print_json(&found)?;
    } else if found.is_empty() {
        println!("All threads triaged.");
    } else {
        for line in untriaged_lines(ctx.out.style, &found) {
            println!("{line}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn untriaged_lines(style: Style, found: &[Thread]) -> Vec<String> {
    let mut lines = vec![
        format!("Untriaged threads ({}):", found.len()),
        String::new(),
        style.dim(&format!(
            "  {:<16} {:<12} {:<40} {:>6} {}",
            "THREAD", "ACCOUNT", "SUBJECT", "EMAILS", "LATEST"
        )),
    ];
    lines.extend(found.iter().map(|t| {
        format!(
            "  {:<16} {:<12} {:<40} {:>6} {}",
            truncate(&t.thread_id, 16),
            account_label(&t.account),
            truncate(&t.subject, 40),
            t.email_count,
            time_ago(&t.latest_date)
        )
    }));
    lines
}

/// One list line for a tracker issue.
fn issue_line(style: Style, issue: &Issue) -> String {
    let priority = issue.mb_priority();
    format!(
        "  {} {}  {}  {}",
        style.priority_dot(priority),
        style.dim(&issue.id),
        style.priority_label(priority),
        style.dim(&issue.title)
    )
}

/// One list line for a ledger record.
fn record_line(style: Style, record: &TriageRecord) -> String {
    let short: String = record.id.chars().take(8).collect();
    format!(
        "  {} {}  {}  {}  {}",
        style.priority_dot(record.priority),
        style.dim(&short),
        style.priority_label(record.priority),
        record.action,
        style.dim(&format!(
            "{} · {}",
            account_label(&record.account),
            truncate(&record.subject, 45)
        ))
    )
}

pub async fn inbox(
    ctx: &CommandContext,
    account: Option<String>,
    priority: Option<&str>,
    all: bool,
) -> Result<ExitCode, MailbeadsError> {
    let filter = InboxFilter {
        priority: priority.map(Priority::parse).transpose()?,
        account,
        all,
    };
    let label = if all { "total" } else { "pending" };

    let lines = match ctx.generation() {
        SchemaGeneration::CrossReference => {
            let tracker = ctx.tracker();
            require_tracker(&tracker).await?;
            let issues = views::inbox_tracked(
                &tracker,
                ctx.labels(),
                ctx.config.beads.list_limit,
                &filter,
            )
            .await?;
            if ctx.out.json {
                return print(ctx, &issues);
            }
            issues
                .iter()
                .map(|i| issue_line(ctx.out.style, i))
                .collect::<Vec<_>>()
        }
        SchemaGeneration::SelfContained => {
            let records = views::inbox_local(ctx.db()?, &filter).await?;
            if ctx.out.json {
                return print(ctx, &records);
            }
            records
                .iter()
                .map(|r| record_line(ctx.out.style, r))
                .collect()
        }
    };

    if lines.is_empty() {
        println!("Inbox clear.");
    } else {
        println!("Inbox ({} {label}):\n", lines.len());
        for line in lines {
            println!("{line}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn ready(
    ctx: &CommandContext,
    account: Option<&str>,
) -> Result<ExitCode, MailbeadsError> {
    let lines = match ctx.generation() {
        SchemaGeneration::CrossReference => {
            let tracker = ctx.tracker();
            require_tracker(&tracker).await?;
            let issues = views::ready_tracked(
                &tracker,
                ctx.labels(),
                ctx.config.beads.ready_limit,
                account,
            )
            .await?;
            if ctx.out.json {
                return print(ctx, &issues);
            }
            issues
                .iter()
                .map(|i| issue_line(ctx.out.style, i))
                .collect::<Vec<_>>()
        }
        SchemaGeneration::SelfContained => {
            let records = views::ready_local(ctx.db()?, account).await?;
            if ctx.out.json {
                return print(ctx, &records);
            }
            records
                .iter()
                .map(|r| record_line(ctx.out.style, r))
                .collect()
        }
    };

    if lines.is_empty() {
        println!("Nothing actionable right now.");
    } else {
        println!("Ready ({} actionable):\n", lines.len());
        for line in lines {
            println!("{line}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print<T: serde::Serialize>(
    ctx: &CommandContext,
    value: &T,
) -> Result<ExitCode, MailbeadsError> {
    ctx.out.print_json(value)?;
    Ok(ExitCode::SUCCESS)
}

pub async fn show(
    ctx: &CommandContext,
    thread_id: &str,
    account: Option<&str>,
    no_body: bool,
) -> Result<ExitCode, MailbeadsError> {
    let beads = ctx.tracker();
    let tracker: Option<&dyn IssueTracker> = match ctx.generation() {
        SchemaGeneration::CrossReference => Some(&beads),
        SchemaGeneration::SelfContained => None,
    };
    let view = views::show_thread(ctx.db()?, tracker, thread_id, account).await?;

    if ctx.out.json {
        ctx.out.print_json(&view)?;
    } else {
        for line in show_lines(ctx.out.style, &view, no_body) {
            println!("{line}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn show_lines(style: Style, view: &ThreadView, no_body: bool) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Thread: {} ({})",
            view.thread_id,
            account_label(&view.account)
        ),
        format!("Subject: {}", style.bold(&view.subject)),
        format!("Emails: {} messages", view.emails.len()),
        String::new(),
    ];

    let count = view.emails.len();
    for (i, email) in view.emails.iter().enumerate() {
        let body = if no_body {
            ""
        } else {
            email
                .body
                .as_deref()
                .filter(|b| !b.trim().is_empty())
                .or(email.snippet.as_deref())
                .unwrap_or("")
        };
        lines.extend(email_tree(
            style,
            connector(i, count),
            &email.from,
            &email.date,
            body,
        ));
        if i + 1 < count {
            lines.push(style.dim("  │"));
        }
    }
    lines.push(String::new());

    match (&view.issue, &view.triage_ref, &view.record) {
        (Some(issue), _, _) => {
            lines.push(format!(
                "  Issue: {} {}",
                issue.id,
                style.triage_badge(issue.mb_priority(), &issue.title)
            ));
            if let Some(description) = issue.description.as_deref().filter(|d| !d.is_empty()) {
                lines.push(format!("  Description: {description}"));
            }
            if let Some(notes) = issue.notes.as_deref().filter(|n| !n.is_empty()) {
                lines.push(format!("  Notes: {}", style.dim(notes)));
            }
            lines.push(format!("  Status: {}", issue.status));
        }
        (None, Some(triage_ref), _) => {
            let note = if triage_ref.is_placeholder() {
                "(legacy placeholder, run 'mb migrate')"
            } else {
                "(not found in tracker)"
            };
            lines.push(format!(
                "  Issue: {} {}",
                triage_ref.external_id,
                style.dim(note)
            ));
        }
        (None, None, Some(record)) => {
            lines.push(format!(
                "  Triage: {} {}",
                record.id,
                style.triage_badge(record.priority, &record.action)
            ));
            if let Some(suggestion) = &record.suggestion {
                lines.push(format!("  Suggestion: {suggestion}"));
            }
            if let Some(notes) = &record.agent_notes {
                lines.push(format!("  Notes: {}", style.dim(notes)));
            }
            let mut status = record.status.to_string();
            if let Some(until) = &record.snoozed_until {
                status.push_str(&format!(" (snoozed until {until})"));
            }
            lines.push(format!("  Status: {status}"));
        }
        (None, None, None) => lines.push(style.dim("  Triage: (not yet triaged)")),
    }
    lines
}
