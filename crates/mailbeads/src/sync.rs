// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mb sync`.

use std::process::ExitCode;

use mailbeads_core::{IssueTracker, MailbeadsError, SyncResult};
use mailbeads_storage::SchemaGeneration;
use mailbeads_workflow::sync::{self, SyncOptions};

use crate::context::CommandContext;
use crate::display::{Style, account_label};

pub async fn run(ctx: &CommandContext, options: &SyncOptions) -> Result<ExitCode, MailbeadsError> {
    let db = ctx.db()?;
    let provider = ctx.provider()?;
    let beads = ctx.tracker();
    // New-mail comments only make sense when decisions live in the tracker.
    let tracker: Option<&dyn IssueTracker> = match ctx.generation() {
        SchemaGeneration::CrossReference => Some(&beads),
        SchemaGeneration::SelfContained => None,
    };

    if !ctx.out.json {
        let mode = if options.full { " (full)" } else { "" };
        ctx.out.info(&format!("Syncing emails{mode}..."));
    }

    let summary = sync::sync(db, &provider, tracker, &ctx.config.sync, options).await?;

    if ctx.out.json {
        ctx.out.print_json(&summary)?;
        return Ok(ExitCode::SUCCESS);
    }

    for result in &summary.accounts {
        match &result.error {
            Some(error) => ctx
                .out
                .failure(&format!("{}: {error}", account_label(&result.account))),
            None => ctx.out.info(&account_line(ctx.out.style, result)),
        }
    }
    if !ctx.out.quiet {
        println!();
        ctx.out.success(&format!(
            "Done! {} new emails synced. Total in DB: {}",
            summary.total_new, summary.total_in_db
        ));
    }
    Ok(ExitCode::SUCCESS)
}

fn account_line(style: Style, result: &SyncResult) -> String {
    let mut line = format!(
        "  {:<28} {:>4} new  {}",
        account_label(&result.account),
        result.fetched,
        style.dim(&format!("({} already stored)", result.skipped))
    );
    if result.commented > 0 {
        line.push_str(&format!(", {} issues notified", result.commented));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_line_mentions_notifications() {
        let mut result = SyncResult {
            account: "me@work.com".into(),
            fetched: 3,
            skipped: 7,
            ..Default::default()
        };
        assert_eq!(
            account_line(Style::plain(), &result),
            format!("  {:<28}    3 new  (7 already stored)", "work")
        );
        result.commented = 2;
        assert!(account_line(Style::plain(), &result).ends_with(", 2 issues notified"));
    }
}
