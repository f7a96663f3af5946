// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Custodial accounting core.
//!
//! - [`access`] - protocol roles and governance parameters
//! - [`fees`] - governance/operator fee split
//! - [`treasury`] - the two fee treasuries
//! - [`accounts`] - wallet records and the withdrawal timelock
//! - [`token`] - the injected token gateway
//! - [`engine`] - the [`Ledger`] state machine tying them together
//! - [`events`] - receipts and journal entries

pub mod access;
pub mod accounts;
pub mod engine;
pub mod error;
pub mod events;
pub mod fees;
pub mod token;
pub mod treasury;

pub use access::{GovernanceConfig, ProtocolRole, MAX_GOVERNANCE_FEE_RATIO};
pub use accounts::{debit_spendable, AccountLedger, Wallet, WithdrawalState};
pub use engine::{CallContext, CustodyReport, Ledger};
pub use error::{LedgerError, LedgerResult};
pub use events::{LedgerEvent, LedgerEventKind, Receipt, TransferVariant};
pub use fees::{split_fee, FeeSplit};
pub use token::{InMemoryTokenLedger, TokenError, TokenGateway};
pub use treasury::{Treasuries, TreasuryKind};
