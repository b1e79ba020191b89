// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store, the collaborators, and the CLI.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{MailbeadsError, Result};

/// Prefix of external IDs synthesized by the v1 -> v2 migration.
pub const LEGACY_PREFIX: &str = "legacy-";

/// Prefix of the external reference written on tracker issues.
pub const EXTERNAL_REF_PREFIX: &str = "mb:";

/// A fetched message. Immutable once inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub id: String,
    pub account: String,
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Provider-formatted date header.
    pub date: String,
    /// Comma-joined label set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
    pub is_read: bool,
    /// Local fetch timestamp (RFC 3339, UTC).
    pub fetched_at: String,
}

/// A conversation derived from the messages sharing `(thread_id, account)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub thread_id: String,
    pub account: String,
    pub subject: String,
    pub from: String,
    pub email_count: i64,
    pub latest_date: String,
}

/// Triage priority, ordered by urgency.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
    Spam,
}

impl Priority {
    /// Parse a user-supplied priority, rejecting unknown values.
    pub fn parse(value: &str) -> Result<Self> {
        value.parse().map_err(|_| {
            MailbeadsError::Validation(format!(
                "invalid priority {value:?} (must be: high, medium, low, spam)"
            ))
        })
    }

    /// Numeric level written to the issue tracker.
    pub fn tracker_level(self) -> u8 {
        match self {
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
            Self::Spam => 4,
        }
    }

    /// Read a tracker level back. Level 0 also maps to `High`; unknown
    /// levels fall back to `Medium`.
    pub fn from_tracker_level(level: i64) -> Self {
        match level {
            0 | 1 => Self::High,
            2 => Self::Medium,
            3 => Self::Low,
            4 => Self::Spam,
            _ => Self::Medium,
        }
    }
}

/// Lifecycle state of a v1 triage record.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Done,
    Dismissed,
    Snoozed,
}

impl Status {
    /// Parse a user-supplied status, rejecting unknown values.
    pub fn parse(value: &str) -> Result<Self> {
        value.parse().map_err(|_| {
            MailbeadsError::Validation(format!(
                "invalid status {value:?} (must be: pending, done, dismissed, snoozed)"
            ))
        })
    }
}

/// A self-contained (v1) triage decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageRecord {
    pub id: String,
    pub thread_id: String,
    pub account: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub priority: Priority,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snoozed_until: Option<String>,
    pub email_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_date: Option<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// The mutable content of a triage call, validated before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageDecision {
    pub thread_id: String,
    pub account: String,
    pub subject: String,
    pub from: Option<String>,
    pub priority: Priority,
    pub action: String,
    pub suggestion: Option<String>,
    pub agent_notes: Option<String>,
    pub category: Option<String>,
    pub email_count: i64,
    pub latest_date: Option<String>,
}

impl TriageDecision {
    /// Start a decision for a thread snapshot.
    pub fn for_thread(thread: &Thread, priority: Priority, action: impl Into<String>) -> Self {
        Self {
            thread_id: thread.thread_id.clone(),
            account: thread.account.clone(),
            subject: thread.subject.clone(),
            from: Some(thread.from.clone()).filter(|f| !f.is_empty()),
            priority,
            action: action.into(),
            suggestion: None,
            agent_notes: None,
            category: None,
            email_count: thread.email_count,
            latest_date: Some(thread.latest_date.clone()).filter(|d| !d.is_empty()),
        }
    }

    /// Reject decisions missing required content.
    pub fn validate(&self) -> Result<()> {
        if self.action.trim().is_empty() {
            return Err(MailbeadsError::Validation("--action is required".into()));
        }
        if self.thread_id.is_empty() || self.account.is_empty() {
            return Err(MailbeadsError::Validation(
                "thread and account must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// A cross-reference (v2) from a thread to an issue-tracker record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageRef {
    pub thread_id: String,
    pub account: String,
    pub external_id: String,
    pub created_at: String,
}

impl TriageRef {
    /// Whether this ref was synthesized by migration and has no real
    /// external record behind it yet.
    pub fn is_placeholder(&self) -> bool {
        self.external_id.starts_with(LEGACY_PREFIX)
    }
}

/// A thread paired with its cross-reference, as returned by staleness checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadWithRef {
    pub thread: Thread,
    pub triage_ref: TriageRef,
}

/// The subset of issue-tracker fields mailbeads reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default = "default_issue_priority")]
    pub priority: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_reason: Option<String>,
}

fn default_issue_priority() -> i64 {
    2
}

impl Issue {
    /// Priority as a mailbeads priority.
    pub fn mb_priority(&self) -> Priority {
        Priority::from_tracker_level(self.priority)
    }

    /// Whether the tracker considers this issue closed.
    pub fn is_closed(&self) -> bool {
        self.status == "closed"
    }

    /// Thread ID recovered from the `mb:` external reference.
    pub fn thread_id(&self) -> Option<&str> {
        self.external_ref
            .as_deref()
            .and_then(|r| r.strip_prefix(EXTERNAL_REF_PREFIX))
            .filter(|t| !t.is_empty())
    }

    /// Account recovered from the `account=` token in the issue notes.
    pub fn account(&self) -> Option<&str> {
        self.notes
            .as_deref()?
            .split_whitespace()
            .find_map(|tok| tok.strip_prefix("account="))
            .filter(|a| !a.is_empty())
    }
}

/// Parameters for creating a tracker issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewIssue {
    pub title: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub priority: Priority,
    pub category: Option<String>,
    pub parent: Option<String>,
    pub labels: Vec<String>,
    pub thread_id: String,
}

impl NewIssue {
    /// The external reference stored on the issue.
    pub fn external_ref(&self) -> String {
        format!("{EXTERNAL_REF_PREFIX}{}", self.thread_id)
    }
}

/// Message summary returned by a provider search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: String,
    pub thread_id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub date: String,
    pub snippet: String,
}

/// Full decoded message returned by a provider read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullMessage {
    pub id: String,
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
    pub subject: String,
    pub date: String,
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub snippet: String,
}

/// Outcome of syncing a single account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub account: String,
    pub fetched: usize,
    pub skipped: usize,
    #[serde(default)]
    pub commented: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of syncing every account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub accounts: Vec<SyncResult>,
    pub total_new: usize,
    pub total_in_db: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn priority_round_trips_through_strings() {
        for p in Priority::iter() {
            assert_eq!(Priority::parse(&p.to_string()).unwrap(), p);
        }
        assert!(matches!(
            Priority::parse("urgent"),
            Err(MailbeadsError::Validation(_))
        ));
    }

    #[test]
    fn priority_orders_by_urgency() {
        assert!(Priority::High < Priority::Medium);
        assert!(Priority::Low < Priority::Spam);
    }

    #[test]
    fn tracker_level_mapping_is_asymmetric_at_zero() {
        assert_eq!(Priority::High.tracker_level(), 1);
        assert_eq!(Priority::Spam.tracker_level(), 4);
        assert_eq!(Priority::from_tracker_level(0), Priority::High);
        assert_eq!(Priority::from_tracker_level(1), Priority::High);
        assert_eq!(Priority::from_tracker_level(9), Priority::Medium);
    }

    #[test]
    fn placeholder_detection() {
        let mut r = TriageRef {
            thread_id: "t".into(),
            account: "a".into(),
            external_id: "legacy-abc".into(),
            created_at: "2026-01-01T00:00:00Z".into(),
        };
        assert!(r.is_placeholder());
        r.external_id = "bd-12".into();
        assert!(!r.is_placeholder());
    }

    #[test]
    fn issue_recovers_thread_and_account() {
        let issue = Issue {
            id: "bd-1".into(),
            external_ref: Some("mb:19abc".into()),
            notes: Some("from=x@y.com account=me@work.com thread=19abc emails=2".into()),
            ..Default::default()
        };
        assert_eq!(issue.thread_id(), Some("19abc"));
        assert_eq!(issue.account(), Some("me@work.com"));
    }

    #[test]
    fn issue_deserializes_with_missing_fields() {
        let issue: Issue = serde_json::from_str(r#"{"id":"bd-7","title":"Reply"}"#).unwrap();
        assert_eq!(issue.priority, 2);
        assert_eq!(issue.mb_priority(), Priority::Medium);
        assert!(issue.thread_id().is_none());
    }

    #[test]
    fn decision_requires_action() {
        let thread = Thread {
            thread_id: "t1".into(),
            account: "a@b.com".into(),
            subject: "Hi".into(),
            from: "c@d.com".into(),
            email_count: 1,
            latest_date: "Mon, 5 Jan 2026 10:00:00 +0000".into(),
        };
        let decision = TriageDecision::for_thread(&thread, Priority::High, "  ");
        assert!(matches!(
            decision.validate(),
            Err(MailbeadsError::Validation(_))
        ));
        let decision = TriageDecision::for_thread(&thread, Priority::High, "Reply");
        assert!(decision.validate().is_ok());
    }
}
