// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gmail mail provider for mailbeads.
//!
//! Implements [`mailbeads_core::MailProvider`] over the Gmail REST API using
//! per-account access tokens stored beside the project.

pub mod accounts;
pub mod body;
pub mod client;
pub mod types;

pub use accounts::{discover_accounts, load_token};
pub use client::GmailClient;
