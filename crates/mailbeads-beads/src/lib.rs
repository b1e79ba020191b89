// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Issue tracker adapter for mailbeads.
//!
//! Drives the `bd` (beads) CLI as a subprocess and parses its JSON output.
//! Triage decisions created in cross-reference mode live in bd; mailbeads
//! only keeps the mapping.

pub mod args;
pub mod tracker;

pub use tracker::{BeadsCli, discover_beads_db, resolve_binary};
