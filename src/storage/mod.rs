// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Ledger Storage
//!
//! Durable state lives in a single redb file, `<DATA_DIR>/ledger.redb`.
//!
//! ## Layout
//!
//! ```text
//! wallets        principal -> JSON wallet record
//! token_balances principal -> u128 simulated token balance
//! ledger_state   "custody" | "governance" | "treasuries" | "clock" -> JSON
//! events         sequence -> JSON ledger event
//! ```
//!
//! Every committed operation writes its touched rows and its event in one
//! write transaction, so the file never holds a half-applied operation.

pub mod ledger_db;

pub use ledger_db::{CommitBatch, LedgerDb, LedgerDbError, LedgerDbResult, LedgerSnapshot};
