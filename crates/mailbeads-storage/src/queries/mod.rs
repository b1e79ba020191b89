// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the message store and both triage generations.

pub mod emails;
pub mod ledger;
pub mod refs;
pub mod threads;
