// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for mailbeads integration tests.
//!
//! Provides in-memory collaborators and a temporary store so workflow tests
//! run without a mailbox, a `bd` binary, or a project directory.
//!
//! # Components
//!
//! - [`MockMailProvider`] - Mailbox with seeded messages and failure injection
//! - [`MockTracker`] - In-memory issue tracker recording every call
//! - [`TestStore`] - Temporary on-disk store with seeding helpers

pub mod harness;
pub mod mock_provider;
pub mod mock_tracker;

pub use harness::{TestStore, email};
pub use mock_provider::MockMailProvider;
pub use mock_tracker::MockTracker;
