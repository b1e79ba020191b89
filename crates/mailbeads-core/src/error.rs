// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for mailbeads.

use thiserror::Error;

/// The primary error type used across the mailbeads workspace.
#[derive(Debug, Error)]
pub enum MailbeadsError {
    /// Configuration errors (invalid TOML, unknown keys, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A thread, triage record, or external reference does not exist.
    #[error("{kind} {id:?} not found")]
    NotFound { kind: &'static str, id: String },

    /// A thread ID appears under more than one account.
    #[error("thread {thread_id:?} exists in multiple accounts ({}), specify --account", accounts.join(", "))]
    AmbiguousAccount {
        thread_id: String,
        accounts: Vec<String>,
    },

    /// A record-ID prefix matches more than one record.
    #[error("ambiguous ID {prefix:?}, matches: {}", matches.join(", "))]
    AmbiguousId { prefix: String, matches: Vec<String> },

    /// Input rejected before anything was persisted.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The issue tracker binary cannot be found.
    #[error("issue tracker unavailable: {0}")]
    TrackerUnavailable(String),

    /// The issue tracker ran but reported a failure.
    #[error("issue tracker error: {message}")]
    Tracker {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Mail provider errors (auth failure, API error, malformed response).
    #[error("mail provider error for {account}: {message}")]
    Provider {
        account: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Schema detection or migration failed; the store is unusable.
    #[error("schema migration failed: {message}")]
    Migration {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MailbeadsError {
    /// Shorthand for a [`MailbeadsError::NotFound`].
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Shorthand for a [`MailbeadsError::Tracker`] without a source.
    pub fn tracker(message: impl Into<String>) -> Self {
        Self::Tracker {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`MailbeadsError::Provider`] without a source.
    pub fn provider(account: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            account: account.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error is a not-found failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T, E = MailbeadsError> = std::result::Result<T, E>;
