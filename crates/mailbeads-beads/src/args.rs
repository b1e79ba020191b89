// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argument lists for `bd` subcommands.

use std::collections::BTreeMap;

use mailbeads_core::NewIssue;

/// `bd create`. Base labels come first, then the category, then extras.
pub fn create(issue: &NewIssue, base_labels: &[String]) -> Vec<String> {
    let mut args = vec![
        "create".to_string(),
        issue.title.clone(),
        "-p".to_string(),
        issue.priority.tracker_level().to_string(),
        "-t".to_string(),
        "task".to_string(),
        "--external-ref".to_string(),
        issue.external_ref(),
        "--json".to_string(),
        "--silent".to_string(),
    ];

    if let Some(desc) = issue.description.as_deref().filter(|d| !d.is_empty()) {
        args.extend(["-d".to_string(), desc.to_string()]);
    }
    if let Some(notes) = issue.notes.as_deref().filter(|n| !n.is_empty()) {
        args.extend(["--notes".to_string(), notes.to_string()]);
    }

    let labels: Vec<&str> = base_labels
        .iter()
        .map(String::as_str)
        .chain(issue.category.as_deref().filter(|c| !c.is_empty()))
        .chain(issue.labels.iter().map(String::as_str))
        .collect();
    args.extend(["-l".to_string(), labels.join(",")]);

    if let Some(parent) = issue.parent.as_deref().filter(|p| !p.is_empty()) {
        args.extend(["--parent".to_string(), parent.to_string()]);
    }
    args
}

/// `bd update ID -q --KEY VALUE...`
pub fn update(id: &str, fields: &BTreeMap<String, String>) -> Vec<String> {
    let mut args = vec!["update".to_string(), id.to_string(), "-q".to_string()];
    for (key, value) in fields {
        args.push(format!("--{key}"));
        args.push(value.clone());
    }
    args
}

/// `bd close ID -q [-r REASON]`
pub fn close(id: &str, reason: &str) -> Vec<String> {
    let mut args = vec!["close".to_string(), id.to_string(), "-q".to_string()];
    if !reason.is_empty() {
        args.extend(["-r".to_string(), reason.to_string()]);
    }
    args
}

/// `bd show ID --json`
pub fn show(id: &str) -> Vec<String> {
    vec!["show".to_string(), id.to_string(), "--json".to_string()]
}

/// `bd list --json [-l labels] [-s status] [-n limit]`
pub fn list(labels: &[String], status: Option<&str>, limit: u32) -> Vec<String> {
    let mut args = vec!["list".to_string(), "--json".to_string()];
    push_filters(&mut args, labels, limit);
    if let Some(status) = status.filter(|s| !s.is_empty()) {
        args.extend(["-s".to_string(), status.to_string()]);
    }
    args
}

/// `bd ready --json [-l labels] [-n limit]`
pub fn ready(labels: &[String], limit: u32) -> Vec<String> {
    let mut args = vec!["ready".to_string(), "--json".to_string()];
    push_filters(&mut args, labels, limit);
    args
}

/// `bd dep add CHILD PARENT -q`
pub fn add_dependency(child: &str, parent: &str) -> Vec<String> {
    vec![
        "dep".to_string(),
        "add".to_string(),
        child.to_string(),
        parent.to_string(),
        "-q".to_string(),
    ]
}

/// `bd comments add ID TEXT -q`
pub fn comment(id: &str, text: &str) -> Vec<String> {
    vec![
        "comments".to_string(),
        "add".to_string(),
        id.to_string(),
        text.to_string(),
        "-q".to_string(),
    ]
}

fn push_filters(args: &mut Vec<String>, labels: &[String], limit: u32) {
    if !labels.is_empty() {
        args.extend(["-l".to_string(), labels.join(",")]);
    }
    if limit > 0 {
        args.extend(["-n".to_string(), limit.to_string()]);
    }
}
