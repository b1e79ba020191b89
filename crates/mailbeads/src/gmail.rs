// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mb gmail search` and `mb gmail read`: direct provider queries that
//! bypass the store.

use std::process::ExitCode;

use mailbeads_core::{FullMessage, MailProvider, MailbeadsError, MessageSummary};
use serde::Serialize;
use tracing::debug;

use crate::context::CommandContext;
use crate::display::truncate;

const PREVIEW_WIDTH: usize = 100;

/// Accounts to query: the named one, or every discovered account.
async fn target_accounts(
    provider: &dyn MailProvider,
    account: Option<&str>,
) -> Result<Vec<String>, MailbeadsError> {
    let accounts = match account.filter(|a| !a.is_empty()) {
        Some(account) => vec![account.to_string()],
        None => provider.accounts().await?,
    };
    if accounts.is_empty() {
        return Err(MailbeadsError::Config(
            "no accounts found, add account directories with credentials.json to the project root"
                .to_string(),
        ));
    }
    Ok(accounts)
}

pub async fn search(
    ctx: &CommandContext,
    query: &str,
    account: Option<&str>,
    max_results: u32,
) -> Result<ExitCode, MailbeadsError> {
    let provider = ctx.provider()?;
    let mut found: Vec<MessageSummary> = Vec::new();
    for account in target_accounts(&provider, account).await? {
        match provider.search(&account, query, max_results).await {
            Ok(results) => found.extend(results),
            Err(e) => {
                if !ctx.out.quiet {
                    eprintln!("  ! {account}: {e}, skipping");
                }
            }
        }
    }

    if ctx.out.json {
        ctx.out.print_json(&found)?;
    } else if found.is_empty() {
        println!("No messages found matching: {query}");
    } else {
        println!("Found {} message(s) matching: {query}\n", found.len());
        for line in search_lines(&found) {
            println!("{line}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn search_lines(found: &[MessageSummary]) -> Vec<String> {
    found
        .iter()
        .enumerate()
        .flat_map(|(i, msg)| {
            [
                format!("[{}] ID: {}", i + 1, msg.id),
                format!("    From: {}", msg.from),
                format!("    Subject: {}", msg.subject),
                format!("    Date: {}", msg.date),
                format!("    Preview: {}", truncate(&msg.snippet, PREVIEW_WIDTH + 3)),
                String::new(),
            ]
        })
        .collect()
}

#[derive(Serialize)]
struct ReadOutput<'a> {
    account: &'a str,
    #[serde(flatten)]
    message: &'a FullMessage,
}

/// Read a message, trying each account until one has it.
pub async fn read(
    ctx: &CommandContext,
    id: &str,
    account: Option<&str>,
) -> Result<ExitCode, MailbeadsError> {
    let provider = ctx.provider()?;
    for account in target_accounts(&provider, account).await? {
        let message = match provider.read_full(&account, id).await {
            Ok(message) => message,
            Err(e) => {
                debug!(account = %account, id, error = %e, "message not readable from account");
                continue;
            }
        };
        if ctx.out.json {
            ctx.out.print_json(&ReadOutput {
                account: &account,
                message: &message,
            })?;
        } else {
            for line in read_lines(&account, &message) {
                println!("{line}");
            }
        }
        return Ok(ExitCode::SUCCESS);
    }
    Err(MailbeadsError::not_found("message", id))
}

fn read_lines(account: &str, message: &FullMessage) -> Vec<String> {
    let mut lines = vec![
        format!("Account: {account}"),
        format!("From: {}", message.from),
        format!("To: {}", message.to),
    ];
    if let Some(cc) = &message.cc {
        lines.push(format!("Cc: {cc}"));
    }
    lines.push(format!("Subject: {}", message.subject));
    lines.push(format!("Date: {}", message.date));
    if !message.labels.is_empty() {
        lines.push(format!("Labels: {}", message.labels.join(", ")));
    }
    lines.push(String::new());
    lines.push(message.body.clone());
    lines
}
