// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mb triage`, `mb done`, `mb dismiss`, and `mb snooze`.

use std::process::ExitCode;

use mailbeads_core::{CLOSE_REASON_DISMISSED, CLOSE_REASON_DONE, MailbeadsError, Status};
use mailbeads_storage::SchemaGeneration;
use mailbeads_workflow::triage::{
    self, CloseOutcome, TriageOutcome, TriageRequest, close_local, close_tracked,
};

use crate::context::CommandContext;
use crate::display::Style;

pub async fn triage(
    ctx: &CommandContext,
    request: &TriageRequest,
) -> Result<ExitCode, MailbeadsError> {
    let db = ctx.db()?;
    let outcome = match ctx.generation() {
        SchemaGeneration::SelfContained => triage::triage_local(db, request).await?,
        SchemaGeneration::CrossReference => {
            let tracker = ctx.tracker();
            triage::triage_tracked(db, &tracker, request).await?
        }
    };

    if ctx.out.json {
        ctx.out.print_json(&outcome)?;
    } else {
        for line in triage_lines(&outcome) {
            ctx.out.success(&line);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn triage_lines(outcome: &TriageOutcome) -> Vec<String> {
    let verb = if outcome.created { "Triaged" } else { "Updated" };
    let mut lines = vec![format!(
        "{verb} {} [{}] \"{}\"",
        outcome.id, outcome.priority, outcome.action
    )];
    if let Some(dep) = &outcome.depends_on {
        lines.push(format!("{} now depends on {dep}", outcome.id));
    }
    lines
}

/// How `done`/`dismiss` close an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseKind {
    Done,
    Dismiss,
}

impl CloseKind {
    fn status(self) -> Status {
        match self {
            Self::Done => Status::Done,
            Self::Dismiss => Status::Dismissed,
        }
    }

    fn reason(self) -> &'static str {
        match self {
            Self::Done => CLOSE_REASON_DONE,
            Self::Dismiss => CLOSE_REASON_DISMISSED,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Done => "close",
            Self::Dismiss => "dismiss",
        }
    }
}

/// Close every ID, then exit non-zero if any of them failed.
pub async fn close(
    ctx: &CommandContext,
    ids: &[String],
    kind: CloseKind,
) -> Result<ExitCode, MailbeadsError> {
    let db = ctx.db()?;
    let outcomes = match ctx.generation() {
        SchemaGeneration::SelfContained => close_local(db, ids, kind.status()).await?,
        SchemaGeneration::CrossReference => {
            let tracker = ctx.tracker();
            close_tracked(db, &tracker, ids, kind.reason()).await?
        }
    };

    if ctx.out.json {
        ctx.out.print_json(&outcomes)?;
    } else {
        for outcome in &outcomes {
            match close_line(ctx.out.style, kind, outcome) {
                Ok(line) => println!("{line}"),
                Err(line) => ctx.out.failure(&line),
            }
        }
    }

    Ok(if outcomes.iter().all(|o| o.closed) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// The line for one close: `Ok` for stdout, `Err` for stderr.
fn close_line(style: Style, kind: CloseKind, outcome: &CloseOutcome) -> Result<String, String> {
    if !outcome.closed {
        let error = outcome.error.as_deref().unwrap_or("unknown error");
        return Err(format!("{} {}: {error}", kind.verb(), outcome.id));
    }
    let id = outcome.resolved.as_deref().unwrap_or(&outcome.id);
    Ok(match kind {
        CloseKind::Done => format!("{} Done: {id}", style.green("✓")),
        CloseKind::Dismiss => format!("{} Dismissed: {id}", style.dim("✗")),
    })
}

pub async fn snooze(
    ctx: &CommandContext,
    id: &str,
    until: &str,
) -> Result<ExitCode, MailbeadsError> {
    if ctx.generation() == SchemaGeneration::CrossReference {
        return Err(MailbeadsError::Validation(
            "snooze needs the local triage backend (set triage.backend = \"local\")".to_string(),
        ));
    }
    let outcome = triage::snooze_local(ctx.db()?, id, until).await?;
    if ctx.out.json {
        ctx.out.print_json(&outcome)?;
    } else {
        ctx.out.success(&format!(
            "Snoozed {} until {}",
            outcome.id, outcome.snoozed_until
        ));
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailbeads_core::Priority;

    fn closed(id: &str, resolved: Option<&str>) -> CloseOutcome {
        CloseOutcome {
            id: id.into(),
            resolved: resolved.map(str::to_string),
            closed: true,
            ref_removed: true,
            error: None,
        }
    }

    #[test]
    fn close_lines_prefer_resolved_ids() {
        let style = Style::plain();
        assert_eq!(
            close_line(style, CloseKind::Done, &closed("ab12", Some("ab12cd34ef56ab78"))),
            Ok("✓ Done: ab12cd34ef56ab78".to_string())
        );
        assert_eq!(
            close_line(style, CloseKind::Dismiss, &closed("bd-3", None)),
            Ok("✗ Dismissed: bd-3".to_string())
        );
    }

    #[test]
    fn failed_close_goes_to_stderr() {
        let failed = CloseOutcome {
            id: "bd-9".into(),
            resolved: None,
            closed: false,
            ref_removed: false,
            error: Some("no issue found".into()),
        };
        assert_eq!(
            close_line(Style::plain(), CloseKind::Dismiss, &failed),
            Err("dismiss bd-9: no issue found".to_string())
        );
    }

    #[test]
    fn triage_line_reports_update_and_dependency() {
        let outcome = TriageOutcome {
            thread_id: "t1".into(),
            account: "me@x.com".into(),
            id: "bd-4".into(),
            action: "Reply with dates".into(),
            priority: Priority::High,
            subject: "Trip".into(),
            created: false,
            depends_on: Some("bd-1".into()),
        };
        assert_eq!(
            triage_lines(&outcome),
            vec![
                "Updated bd-4 [high] \"Reply with dates\"".to_string(),
                "bd-4 now depends on bd-1".to_string(),
            ]
        );
    }
}
