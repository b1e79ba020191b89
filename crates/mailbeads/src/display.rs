// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal formatting shared by every command.
//!
//! Color is decided once per invocation: only when stdout is a terminal and
//! `--json` is off. Every helper returns plain text when color is off, so the
//! same code path serves pipes and tests.

use std::io::IsTerminal;

use chrono::{DateTime, Utc};
use colored::Colorize;
use mailbeads_core::{MailbeadsError, Priority, clock};
use serde::Serialize;

/// Body lines shown per message before eliding the rest.
const BODY_PREVIEW_LINES: usize = 4;

/// Width body lines are truncated to.
const BODY_LINE_WIDTH: usize = 80;

/// Text styling with color switched on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    color: bool,
}

impl Style {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn dim(&self, s: &str) -> String {
        if self.color {
            s.bright_black().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn bold(&self, s: &str) -> String {
        if self.color {
            s.bold().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn green(&self, s: &str) -> String {
        if self.color {
            s.green().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn red(&self, s: &str) -> String {
        if self.color {
            s.red().to_string()
        } else {
            s.to_string()
        }
    }

    fn for_priority(&self, priority: Priority, s: &str) -> String {
        if !self.color {
            return s.to_string();
        }
        match priority {
            Priority::High => s.red().to_string(),
            Priority::Medium => s.yellow().to_string(),
            Priority::Low => s.bright_black().to_string(),
            Priority::Spam => s.dimmed().to_string(),
        }
    }

    /// A dot marking the priority: filled for high, hollow otherwise.
    pub fn priority_dot(&self, priority: Priority) -> String {
        let dot = match priority {
            Priority::High => "●",
            Priority::Medium | Priority::Low => "○",
            Priority::Spam => "◌",
        };
        self.for_priority(priority, dot)
    }

    /// Uppercase priority padded to six columns.
    pub fn priority_label(&self, priority: Priority) -> String {
        let label = format!("{:<6}", priority.to_string().to_uppercase());
        self.for_priority(priority, &label)
    }

    /// Dot, label, and action on one line.
    pub fn triage_badge(&self, priority: Priority, action: &str) -> String {
        format!(
            "{} {} {action}",
            self.priority_dot(priority),
            self.priority_label(priority)
        )
    }
}

/// Output flags and the style derived from them.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub quiet: bool,
    pub style: Style,
}

impl Output {
    /// Decide styling from the global flags and the attached terminal.
    pub fn detect(json: bool, quiet: bool) -> Self {
        let color = !json && std::io::stdout().is_terminal();
        Self {
            json,
            quiet,
            style: Style::new(color),
        }
    }

    /// Print a value as indented JSON on stdout.
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), MailbeadsError> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| MailbeadsError::Internal(format!("failed to encode JSON: {e}")))?;
        println!("{text}");
        Ok(())
    }

    /// Print a progress or hint line unless `-q` was given.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{message}");
        }
    }

    pub fn success(&self, message: &str) {
        println!("{} {message}", self.style.green("✓"));
    }

    /// Print a failure line on stderr.
    pub fn failure(&self, message: &str) {
        eprintln!("{} {message}", self.style.red("✗"));
    }
}

/// Short label for an account: the domain without its top-level part.
///
/// `user@example.com` becomes `example`; strings without `@` pass through.
pub fn account_label(account: &str) -> &str {
    match account.split_once('@') {
        Some((local, domain)) if !local.is_empty() => match domain.split_once('.') {
            Some((name, _)) if !name.is_empty() => name,
            _ => domain,
        },
        _ => account,
    }
}

/// Shorten `s` to at most `max` characters, ending in `...` when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max <= 3 {
        return s.chars().take(max).collect();
    }
    let mut cut: String = s.chars().take(max - 3).collect();
    cut.push_str("...");
    cut
}

/// Relative time for a stored timestamp or date header.
pub fn time_ago(value: &str) -> String {
    time_ago_at(value, Utc::now())
}

/// [`time_ago`] measured from `now`.
pub fn time_ago_at(value: &str, now: DateTime<Utc>) -> String {
    if value.is_empty() {
        return String::new();
    }
    let Some(at) = clock::parse_any(value) else {
        return value.chars().take(10).collect();
    };
    let elapsed = now.signed_duration_since(at);
    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_days() < 1 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{}d ago", elapsed.num_days())
    } else {
        at.format("%b %-d").to_string()
    }
}

/// Tree connector for message `index` of `count`.
pub fn connector(index: usize, count: usize) -> &'static str {
    if count == 1 {
        "──"
    } else if index == 0 {
        "┌─"
    } else if index + 1 == count {
        "└─"
    } else {
        "├─"
    }
}

/// Lines for one message in a thread tree: a header, then up to
/// [`BODY_PREVIEW_LINES`] of body text.
pub fn email_tree(style: Style, connector: &str, from: &str, date: &str, body: &str) -> Vec<String> {
    let mut lines = vec![format!(
        "  {} {}  ·  {}",
        style.dim(connector),
        style.bold(from),
        style.dim(&time_ago(date))
    )];
    let body = body.trim();
    if body.is_empty() {
        return lines;
    }

    let prefix = if connector == "└─" { "     " } else { "  │  " };
    let body_lines: Vec<&str> = body.lines().collect();
    for line in body_lines.iter().take(BODY_PREVIEW_LINES) {
        lines.push(format!(
            "{}{}",
            style.dim(prefix),
            truncate(line.trim(), BODY_LINE_WIDTH)
        ));
    }
    if body_lines.len() > BODY_PREVIEW_LINES {
        let more = format!("... ({} more lines)", body_lines.len() - BODY_PREVIEW_LINES);
        lines.push(format!("{}{}", style.dim(prefix), style.dim(&more)));
    }
    lines
}
