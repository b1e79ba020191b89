// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock mail provider for deterministic testing.
//!
//! `MockMailProvider` implements `MailProvider` over seeded messages. Queries
//! are recorded but not interpreted: a search returns the account's messages
//! in insertion order, up to `max_results`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use mailbeads_core::{FullMessage, MailProvider, MailbeadsError, MessageSummary};

#[derive(Default)]
struct State {
    mailboxes: BTreeMap<String, Vec<FullMessage>>,
    failing_accounts: BTreeSet<String>,
    failing_reads: BTreeSet<String>,
    queries: Vec<(String, String)>,
}

/// In-memory mailbox with failure injection.
#[derive(Clone, Default)]
pub struct MockMailProvider {
    state: Arc<Mutex<State>>,
}

impl MockMailProvider {
    /// Create a provider with no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account with an empty mailbox.
    pub async fn add_account(&self, account: &str) {
        self.state
            .lock()
            .await
            .mailboxes
            .entry(account.to_string())
            .or_default();
    }

    /// Add a message to an account, registering the account if needed.
    pub async fn add_message(&self, account: &str, message: FullMessage) {
        self.state
            .lock()
            .await
            .mailboxes
            .entry(account.to_string())
            .or_default()
            .push(message);
    }

    /// Make every search against `account` fail.
    pub async fn fail_account(&self, account: &str) {
        self.state
            .lock()
            .await
            .failing_accounts
            .insert(account.to_string());
    }

    /// Make full reads of message `id` fail.
    pub async fn fail_read(&self, id: &str) {
        self.state.lock().await.failing_reads.insert(id.to_string());
    }

    /// Every `(account, query)` searched so far.
    pub async fn queries(&self) -> Vec<(String, String)> {
        self.state.lock().await.queries.clone()
    }

    /// Build an unread inbox message.
    pub fn message(id: &str, thread_id: &str, from: &str, subject: &str, date: &str) -> FullMessage {
        FullMessage {
            id: id.to_string(),
            thread_id: thread_id.to_string(),
            message_id: Some(format!("<{id}@mock>")),
            from: from.to_string(),
            to: "me@example.com".to_string(),
            cc: None,
            subject: subject.to_string(),
            date: date.to_string(),
            body: format!("body of {id}"),
            labels: vec!["INBOX".to_string(), "UNREAD".to_string()],
            snippet: format!("snippet of {id}"),
        }
    }
}

fn summary(msg: &FullMessage) -> MessageSummary {
    MessageSummary {
        id: msg.id.clone(),
        thread_id: msg.thread_id.clone(),
        from: msg.from.clone(),
        to: msg.to.clone(),
        subject: msg.subject.clone(),
        date: msg.date.clone(),
        snippet: msg.snippet.clone(),
    }
}

#[async_trait]
impl MailProvider for MockMailProvider {
    async fn accounts(&self) -> Result<Vec<String>, MailbeadsError> {
        Ok(self.state.lock().await.mailboxes.keys().cloned().collect())
    }

    async fn search(
        &self,
        account: &str,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<MessageSummary>, MailbeadsError> {
        let mut state = self.state.lock().await;
        state.queries.push((account.to_string(), query.to_string()));
        if state.failing_accounts.contains(account) {
            return Err(MailbeadsError::provider(account, "mock search failure"));
        }
        let mailbox = state
            .mailboxes
            .get(account)
            .ok_or_else(|| MailbeadsError::provider(account, "unknown account"))?;
        Ok(mailbox
            .iter()
            .take(max_results as usize)
            .map(summary)
            .collect())
    }

    async fn read_full(&self, account: &str, message_id: &str) -> Result<FullMessage, MailbeadsError> {
        let state = self.state.lock().await;
        if state.failing_reads.contains(message_id) {
            return Err(MailbeadsError::provider(account, format!("mock read failure for {message_id}")));
        }
        state
            .mailboxes
            .get(account)
            .and_then(|mailbox| mailbox.iter().find(|m| m.id == message_id))
            .cloned()
            .ok_or_else(|| MailbeadsError::not_found("message", message_id))
    }
}
