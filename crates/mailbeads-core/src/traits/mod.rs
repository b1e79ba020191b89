// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits implemented by the mail provider and issue tracker
//! adapters.

pub mod provider;
pub mod tracker;

pub use provider::MailProvider;
pub use tracker::IssueTracker;
