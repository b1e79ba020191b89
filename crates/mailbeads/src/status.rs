// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mb status` and `mb stats`.

use std::process::ExitCode;

use mailbeads_core::{MailbeadsError, Priority};
use mailbeads_workflow::status::{self, AccountSyncState, StatusItem, StatusReport, Stats};

use crate::context::CommandContext;
use crate::display::{Style, account_label, time_ago, truncate};

pub async fn status(
    ctx: &CommandContext,
    include_ready: bool,
) -> Result<ExitCode, MailbeadsError> {
    let tracker = ctx.tracker();
    let report = status::status(ctx.db()?, ctx.triage_source(&tracker), include_ready).await?;

    if ctx.out.json {
        ctx.out.print_json(&report)?;
    } else {
        for line in status_lines(ctx.out.style, &report) {
            println!("{line}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn stats(ctx: &CommandContext) -> Result<ExitCode, MailbeadsError> {
    let tracker = ctx.tracker();
    let stats = status::stats(ctx.db()?, ctx.triage_source(&tracker)).await?;

    if ctx.out.json {
        ctx.out.print_json(&stats)?;
    } else {
        for line in stats_lines(ctx.out.style, &stats) {
            println!("{line}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn account_row(style: Style, account: &str, emails: i64, last_sync: Option<&str>) -> String {
    let sync_info = last_sync
        .map(|at| format!("(last sync: {})", time_ago(at)))
        .unwrap_or_default();
    format!(
        "    {:<28} {emails:>4} emails  {}",
        account_label(account),
        style.dim(&sync_info)
    )
}

fn item_rows(style: Style, item: &StatusItem, action_width: usize) -> [String; 2] {
    let id: String = item.id.chars().take(8).collect();
    [
        format!(
            "    {} {}  {:<12}  {}",
            style.priority_dot(item.priority),
            style.dim(&id),
            account_label(&item.account),
            truncate(&item.subject, 45)
        ),
        format!(
            "      {}  {}",
            style.dim("action:"),
            truncate(&item.action, action_width)
        ),
    ]
}

fn sync_rows(style: Style, states: &[AccountSyncState]) -> impl Iterator<Item = String> + '_ {
    states
        .iter()
        .map(move |s| account_row(style, &s.account, s.emails, s.last_sync.as_deref()))
}

fn status_lines(style: Style, report: &StatusReport) -> Vec<String> {
    let summary = &report.summary;
    let mut lines = vec![style.bold("Mailbeads Status"), String::new(), "  Sync".to_string()];
    lines.extend(sync_rows(style, &report.sync_state));
    lines.push(format!(
        "    {}",
        style.dim(&format!(
            "{} emails across {} threads",
            summary.total_emails, summary.threads
        ))
    ));
    lines.push(String::new());

    lines.push("  Triage".to_string());
    let mut detail = String::new();
    if summary.pending > 0 {
        let parts: Vec<String> = [Priority::High, Priority::Medium, Priority::Low]
            .into_iter()
            .filter_map(|p| {
                let count = summary.priority.get(&p).copied().unwrap_or(0);
                (count > 0).then(|| format!("{count} {p}"))
            })
            .collect();
        if !parts.is_empty() {
            detail = format!(" ({})", parts.join(", "));
        }
    }
    lines.push(format!("    Pending:     {:>3}{detail}", summary.pending));
    lines.push(format!("    Done:        {:>3}", summary.done));
    lines.push(format!("    Dismissed:   {:>3}", summary.dismissed));
    if summary.untriaged > 0 {
        lines.push(format!(
            "    Untriaged:   {}",
            style.red(&format!("{:>3} threads", summary.untriaged))
        ));
    } else {
        lines.push(format!("    Untriaged:     0 {}", style.green("(all triaged)")));
    }
    if report.include_ready {
        lines.push(format!("    Ready:       {:>3} actionable", summary.ready));
    }
    lines.push(String::new());

    if !report.high_priority.is_empty() {
        lines.push(format!("  High Priority ({})", report.high_priority.len()));
        for item in &report.high_priority {
            lines.extend(item_rows(style, item, usize::MAX));
        }
        lines.push(String::new());
    }

    if let Some(next) = report.next_up() {
        lines.push("  Next Up".to_string());
        for item in &next.items {
            lines.extend(item_rows(style, item, 55));
        }
        if next.more > 0 {
            lines.push(format!(
                "    {}",
                style.dim(&format!(
                    "... and {} more (run 'mb ready' to see all)",
                    next.more
                ))
            ));
        }
        lines.push(String::new());
    }

    lines.push(format!(
        "  {}",
        style.dim("Use 'mb inbox' to browse, 'mb show THREAD' to read, 'mb done ID' to clear.")
    ));
    lines
}

fn stats_lines(style: Style, stats: &Stats) -> Vec<String> {
    let mut lines = vec![
        style.bold("Mailbeads Statistics"),
        String::new(),
        "  Emails".to_string(),
    ];
    lines.extend(stats.emails.iter().map(|(account, s)| {
        account_row(style, account, s.count, s.last_sync.as_deref())
    }));
    lines.push(String::new());

    lines.push("  Triage".to_string());
    lines.push(format!("    Triaged    {:>3} threads", stats.triaged));
    lines.push(format!("    Untriaged  {:>3} threads", stats.untriaged));
    if let Some(open) = stats.tracker_open.filter(|n| *n > 0) {
        lines.push(format!("    Open issues {open:>3}"));
    }
    lines.push(String::new());

    lines.push(format!(
        "  Total: {} emails across {} threads",
        stats.total_emails, stats.threads
    ));
    lines
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use mailbeads_workflow::status::{AccountStats, StatusSummary};

    use super::*;

    fn item(id: &str, priority: Priority) -> StatusItem {
        StatusItem {
            id: id.into(),
            thread_id: format!("t-{id}"),
            priority,
            account: "me@work.com".into(),
            subject: format!("Subject {id}"),
            action: format!("Act on {id}"),
            from: None,
        }
    }

    fn report(high: Vec<StatusItem>, actions: Vec<StatusItem>, ready: usize) -> StatusReport {
        let mut priority = BTreeMap::new();
        priority.insert(Priority::High, high.len() as i64);
        priority.insert(Priority::Medium, 2);
        priority.insert(Priority::Low, 0);
        priority.insert(Priority::Spam, 1);
        StatusReport {
            summary: StatusSummary {
                total_emails: 12,
                threads: 5,
                untriaged: 0,
                pending: 4,
                done: 1,
                dismissed: 2,
                priority,
                ready,
            },
            high_priority: high,
            action_items: actions,
            sync_state: vec![AccountSyncState {
                account: "me@work.com".into(),
                emails: 12,
                last_sync: None,
            }],
            include_ready: true,
        }
    }

    #[test]
    fn status_lists_breakdown_and_next_up() {
        let report = report(
            vec![item("h1", Priority::High)],
            vec![item("h1", Priority::High), item("m1", Priority::Medium)],
            4,
        );
        let lines = status_lines(Style::plain(), &report);
        assert!(lines.contains(&"    Pending:       4 (1 high, 2 medium)".to_string()));
        assert!(lines.contains(&"    Untriaged:     0 (all triaged)".to_string()));
        assert!(lines.contains(&"  High Priority (1)".to_string()));
        assert!(lines.contains(&"  Next Up".to_string()));
        assert!(lines.contains(&"    ... and 2 more (run 'mb ready' to see all)".to_string()));
        assert_eq!(
            lines.iter().filter(|l| l.contains("Subject h1")).count(),
            1,
            "high items are not repeated under Next Up"
        );
    }

    #[test]
    fn status_skips_next_up_when_only_high_items_are_ready() {
        let high = vec![item("h1", Priority::High)];
        let report = report(high.clone(), high, 1);
        let lines = status_lines(Style::plain(), &report);
        assert!(!lines.contains(&"  Next Up".to_string()));
    }

    #[test]
    fn stats_hide_zero_open_issues() {
        let mut emails = BTreeMap::new();
        emails.insert(
            "me@work.com".to_string(),
            AccountStats {
                count: 3,
                last_sync: None,
            },
        );
        let mut stats = Stats {
            emails,
            untriaged: 1,
            triaged: 2,
            total_emails: 3,
            threads: 2,
            tracker_open: Some(0),
        };
        let lines = stats_lines(Style::plain(), &stats);
        assert_eq!(lines[3], format!("    {:<28}    3 emails  ", "work"));
        assert!(!lines.iter().any(|l| l.contains("Open issues")));

        stats.tracker_open = Some(5);
        let lines = stats_lines(Style::plain(), &stats);
        assert!(lines.contains(&"    Open issues   5".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("  Total: 3 emails across 2 threads"));
    }
}
