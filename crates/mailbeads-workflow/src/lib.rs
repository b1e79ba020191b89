// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Workflows that compose the store with the mail provider and the issue
//! tracker.
//!
//! Every entry point takes its collaborators explicitly. Cross-reference
//! mode functions are suffixed `_tracked`; self-contained mode functions
//! are suffixed `_local`.

pub mod reconcile;
pub mod status;
pub mod sync;
pub mod triage;
pub mod views;

use mailbeads_core::{IssueTracker, MailbeadsError};

/// Fail fast when the tracker cannot be reached.
pub async fn require_tracker(tracker: &dyn IssueTracker) -> Result<(), MailbeadsError> {
    if tracker.is_available().await {
        Ok(())
    } else {
        Err(MailbeadsError::TrackerUnavailable(
            "bd (beads) CLI not found on PATH, install it from https://beads.sh".to_string(),
        ))
    }
}
