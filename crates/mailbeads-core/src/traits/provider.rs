// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mail provider trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{FullMessage, MessageSummary};

/// Read-only access to a remote mailbox.
///
/// Implementations own account discovery and credential handling; callers
/// only see account identifiers (email addresses).
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Accounts with usable credentials, sorted.
    async fn accounts(&self) -> Result<Vec<String>>;

    /// Run a provider search query and return up to `max_results` summaries.
    async fn search(
        &self,
        account: &str,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<MessageSummary>>;

    /// Fetch a single message with its decoded body.
    async fn read_full(&self, account: &str, message_id: &str) -> Result<FullMessage>;
}
