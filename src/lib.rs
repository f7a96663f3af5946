// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bolt Ledger - Custodial sBTC Accounting Service
//!
//! Per-principal balance ledger over a fungible token held in custody, with
//! fee-bearing transfers, timelocked withdrawals and a governance/operator
//! treasury pair.
//!
//! ## Modules
//!
//! - `ledger` - Core state machine (roles, fees, treasuries, wallets, transfers)
//! - `service` - Clock, event journal and persistence around the ledger
//! - `storage` - redb-backed durable state
//! - `chain` - Block height source
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Caller identity extraction

pub mod api;
pub mod auth;
pub mod chain;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod service;
pub mod state;
pub mod storage;
