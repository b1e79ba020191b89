// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mb migrate` and `mb reconcile`.

use std::process::ExitCode;

use mailbeads_core::MailbeadsError;
use mailbeads_storage::SchemaGeneration;
use mailbeads_workflow::reconcile::{self, MigrationReport, ReconcileReport};

use crate::context::CommandContext;
use crate::display::{Style, truncate};

fn require_tracked(ctx: &CommandContext, command: &str) -> Result<(), MailbeadsError> {
    match ctx.generation() {
        SchemaGeneration::CrossReference => Ok(()),
        SchemaGeneration::SelfContained => Err(MailbeadsError::Validation(format!(
            "{command} needs the beads triage backend (set triage.backend = \"beads\")"
        ))),
    }
}

pub async fn migrate(ctx: &CommandContext, dry_run: bool) -> Result<ExitCode, MailbeadsError> {
    require_tracked(ctx, "migrate")?;
    let tracker = ctx.tracker();
    let report = reconcile::migrate_legacy(ctx.db()?, &tracker, dry_run).await?;

    if ctx.out.json {
        ctx.out.print_json(&report)?;
    } else {
        for line in migrate_lines(ctx.out.style, &report) {
            println!("{line}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn migrate_lines(style: Style, report: &MigrationReport) -> Vec<String> {
    if report.found == 0 {
        return vec!["No legacy triage entries to migrate.".to_string()];
    }
    let mut lines = vec![format!("Found {} legacy triage entries.", report.found)];
    for item in &report.migrated {
        let subject = truncate(&item.subject, 50);
        lines.push(match &item.external_id {
            Some(id) => format!(
                "  {} Migrated {} -> {id}  {}",
                style.green("✓"),
                item.thread_id,
                style.dim(&subject)
            ),
            None => format!(
                "  [dry-run] Would create issue for {}  {}",
                item.thread_id,
                style.dim(&subject)
            ),
        });
    }
    for skipped in &report.skipped {
        lines.push(format!(
            "  {} Skipped {}: {}",
            style.red("✗"),
            skipped.thread_id,
            skipped.reason
        ));
    }
    if !report.dry_run {
        lines.push(String::new());
        lines.push(format!(
            "Migrated {} of {}.",
            report.migrated.len(),
            report.found
        ));
    }
    lines
}

/// Exits non-zero when the tracker could not answer for some ref.
pub async fn reconcile(ctx: &CommandContext, dry_run: bool) -> Result<ExitCode, MailbeadsError> {
    require_tracked(ctx, "reconcile")?;
    let tracker = ctx.tracker();
    let report = reconcile::reconcile_refs(ctx.db()?, &tracker, ctx.labels(), dry_run).await?;

    if ctx.out.json {
        ctx.out.print_json(&report)?;
    } else {
        for line in reconcile_lines(ctx.out.style, &report) {
            println!("{line}");
        }
    }
    Ok(if report.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn reconcile_lines(style: Style, report: &ReconcileReport) -> Vec<String> {
    let prefix = if report.dry_run { "[dry-run] Would remove" } else { "Removed" };
    let mut lines: Vec<String> = report
        .removed
        .iter()
        .map(|entry| {
            format!(
                "  {prefix} ref {} -> {} {}",
                entry.thread_id,
                entry.external_id,
                style.dim(&format!("({})", entry.reason))
            )
        })
        .collect();

    let prefix = if report.dry_run { "[dry-run] Would restore" } else { "Restored" };
    lines.extend(report.restored.iter().map(|r| {
        format!("  {prefix} ref {} -> {}", r.thread_id, r.external_id)
    }));
    lines.extend(report.errors.iter().map(|entry| {
        format!(
            "  {} {} -> {}: {}",
            style.red("✗"),
            entry.thread_id,
            entry.external_id,
            entry.reason
        )
    }));

    lines.push(format!(
        "{} removed, {} restored, {} unchanged, {} errors.",
        report.removed.len(),
        report.restored.len(),
        report.unchanged,
        report.errors.len()
    ));
    lines
}
