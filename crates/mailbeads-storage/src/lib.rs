// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for mailbeads.
//!
//! Provides the message store, thread aggregation, both triage ledger
//! generations, and the schema migrator. All statements run on
//! `tokio-rusqlite`'s single background thread.

pub mod database;
pub mod discovery;
pub mod queries;
pub mod schema;

pub use database::Database;
pub use schema::SchemaGeneration;
