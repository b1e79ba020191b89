// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for mailbeads.
//!
//! This crate provides the domain types, the shared error type, and the
//! collaborator traits (mail provider and issue tracker) used throughout the
//! mailbeads workspace.

pub mod clock;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{MailbeadsError, Result};
pub use traits::{IssueTracker, MailProvider};
pub use types::{
    EXTERNAL_REF_PREFIX, Email, FullMessage, Issue, LEGACY_PREFIX, MessageSummary, NewIssue,
    Priority, Status, SyncResult, SyncSummary, Thread, ThreadWithRef, TriageDecision,
    TriageRecord, TriageRef,
};

/// Close reason recorded when a thread is marked done.
pub const CLOSE_REASON_DONE: &str = "done";

/// Close reason recorded when a thread is dismissed.
pub const CLOSE_REASON_DISMISSED: &str = "dismissed — spam/irrelevant";
