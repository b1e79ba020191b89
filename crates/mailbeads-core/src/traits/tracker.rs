// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Issue tracker trait.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Issue, NewIssue};

/// External issue tracker that owns triage state in cross-reference mode.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Whether the tracker can be reached at all.
    async fn is_available(&self) -> bool;

    /// Create an issue and return it as recorded by the tracker.
    async fn create(&self, issue: &NewIssue) -> Result<Issue>;

    /// Update named fields on an existing issue.
    async fn update(&self, id: &str, fields: &BTreeMap<String, String>) -> Result<()>;

    /// Close an issue with a human-readable reason.
    async fn close(&self, id: &str, reason: &str) -> Result<()>;

    /// Fetch an issue. `Ok(None)` when the tracker has no such record.
    async fn show(&self, id: &str) -> Result<Option<Issue>>;

    /// List issues carrying every label, optionally filtered by status.
    async fn list(&self, labels: &[String], status: Option<&str>, limit: u32)
    -> Result<Vec<Issue>>;

    /// Unblocked open issues carrying every label.
    async fn ready(&self, labels: &[String], limit: u32) -> Result<Vec<Issue>>;

    /// Record that `child` depends on `parent`.
    async fn add_dependency(&self, child: &str, parent: &str) -> Result<()>;

    /// Append a comment to an issue.
    async fn comment(&self, id: &str, text: &str) -> Result<()>;
}
