// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded ledger database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `wallets`: principal → serialized Wallet
//! - `token_balances`: principal → simulated token balance
//! - `ledger_state`: key → value (custody principal, governance config, treasuries, clock)
//! - `events`: sequence → serialized LedgerEvent
//!
//! A committed ledger operation is written by [`LedgerDb::commit`] as one
//! write transaction, so a crash never leaves a wallet update without its
//! journal entry.

use std::path::Path;

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};

use crate::chain::BlockClock;
use crate::ledger::{GovernanceConfig, LedgerEvent, Treasuries, Wallet};
use crate::models::{Amount, Principal};

// =============================================================================
// Table Definitions
// =============================================================================

/// principal → serialized Wallet (JSON bytes).
const WALLETS: TableDefinition<&str, &[u8]> = TableDefinition::new("wallets");

/// principal → token balance in the smallest unit.
const TOKEN_BALANCES: TableDefinition<&str, u128> = TableDefinition::new("token_balances");

/// Singleton state: key → JSON bytes.
const LEDGER_STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("ledger_state");

/// sequence → serialized LedgerEvent (JSON bytes).
const EVENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("events");

const CUSTODY_KEY: &str = "custody";
const GOVERNANCE_KEY: &str = "governance";
const TREASURIES_KEY: &str = "treasuries";
const CLOCK_KEY: &str = "clock";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LedgerDbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type LedgerDbResult<T> = Result<T, LedgerDbError>;

// =============================================================================
// Records
// =============================================================================

/// Everything needed to rebuild the ledger on startup.
#[derive(Debug, Default)]
pub struct LedgerSnapshot {
    /// Principal holding the tokens, `None` on a fresh database.
    pub custody: Option<Principal>,
    /// `None` on a fresh database.
    pub governance: Option<GovernanceConfig>,
    pub treasuries: Treasuries,
    pub clock: Option<BlockClock>,
    pub wallets: Vec<(Principal, Wallet)>,
    pub token_balances: Vec<(Principal, Amount)>,
    /// Highest journal sequence, 0 when empty.
    pub last_sequence: u64,
}

/// Records written by one committed operation.
#[derive(Debug)]
pub struct CommitBatch<'a> {
    pub custody: &'a Principal,
    pub governance: &'a GovernanceConfig,
    pub treasuries: Treasuries,
    pub clock: &'a BlockClock,
    pub wallets: Vec<(Principal, Wallet)>,
    pub token_balances: Vec<(Principal, Amount)>,
    pub event: &'a LedgerEvent,
}

// =============================================================================
// LedgerDb
// =============================================================================

/// Embedded ACID ledger database.
pub struct LedgerDb {
    db: Database,
}

impl LedgerDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> LedgerDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(WALLETS)?;
            let _ = write_txn.open_table(TOKEN_BALANCES)?;
            let _ = write_txn.open_table(LEDGER_STATE)?;
            let _ = write_txn.open_table(EVENTS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Read the complete persisted state.
    pub fn load(&self) -> LedgerDbResult<LedgerSnapshot> {
        let read_txn = self.db.begin_read()?;

        let state = read_txn.open_table(LEDGER_STATE)?;
        let custody = match state.get(CUSTODY_KEY)? {
            Some(v) => Some(serde_json::from_slice(v.value())?),
            None => None,
        };
        let governance = match state.get(GOVERNANCE_KEY)? {
            Some(v) => Some(serde_json::from_slice(v.value())?),
            None => None,
        };
        let treasuries = match state.get(TREASURIES_KEY)? {
            Some(v) => serde_json::from_slice(v.value())?,
            None => Treasuries::default(),
        };
        let clock = match state.get(CLOCK_KEY)? {
            Some(v) => Some(serde_json::from_slice(v.value())?),
            None => None,
        };

        let mut wallets = Vec::new();
        let table = read_txn.open_table(WALLETS)?;
        for entry in table.iter()? {
            let (key, value) = entry?;
            let owner = parse_principal(key.value())?;
            let wallet: Wallet = serde_json::from_slice(value.value())?;
            wallets.push((owner, wallet));
        }

        let mut token_balances = Vec::new();
        let table = read_txn.open_table(TOKEN_BALANCES)?;
        for entry in table.iter()? {
            let (key, value) = entry?;
            token_balances.push((parse_principal(key.value())?, value.value()));
        }

        let events = read_txn.open_table(EVENTS)?;
        let last_sequence = match events.last()? {
            Some((key, _)) => key.value(),
            None => 0,
        };

        Ok(LedgerSnapshot {
            custody,
            governance,
            treasuries,
            clock,
            wallets,
            token_balances,
            last_sequence,
        })
    }

    /// Write every touched record and the journal entry atomically.
    pub fn commit(&self, batch: &CommitBatch<'_>) -> LedgerDbResult<()> {
        let custody = serde_json::to_vec(batch.custody)?;
        let governance = serde_json::to_vec(batch.governance)?;
        let treasuries = serde_json::to_vec(&batch.treasuries)?;
        let clock = serde_json::to_vec(batch.clock)?;
        let event = serde_json::to_vec(batch.event)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut state = write_txn.open_table(LEDGER_STATE)?;
            state.insert(CUSTODY_KEY, custody.as_slice())?;
            state.insert(GOVERNANCE_KEY, governance.as_slice())?;
            state.insert(TREASURIES_KEY, treasuries.as_slice())?;
            state.insert(CLOCK_KEY, clock.as_slice())?;

            let mut wallets = write_txn.open_table(WALLETS)?;
            for (owner, wallet) in &batch.wallets {
                let json = serde_json::to_vec(wallet)?;
                wallets.insert(owner.as_str(), json.as_slice())?;
            }

            let mut balances = write_txn.open_table(TOKEN_BALANCES)?;
            for (owner, amount) in &batch.token_balances {
                balances.insert(owner.as_str(), *amount)?;
            }

            let mut events = write_txn.open_table(EVENTS)?;
            events.insert(batch.event.sequence, event.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Page of journal entries in sequence order, plus the total count.
    pub fn list_events(&self, offset: u64, limit: usize) -> LedgerDbResult<(Vec<LedgerEvent>, u64)> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS)?;
        let total = table.len()?;

        // sequences start at 1
        let start = offset.saturating_add(1);
        let mut events = Vec::with_capacity(limit.min(256));
        for entry in table.range(start..)? {
            if events.len() >= limit {
                break;
            }
            let (_, value) = entry?;
            events.push(serde_json::from_slice(value.value())?);
        }

        Ok((events, total))
    }
}

fn parse_principal(raw: &str) -> LedgerDbResult<Principal> {
    Principal::parse(raw).map_err(|e| LedgerDbError::Corrupt(format!("principal {raw}: {e}")))
}

// =============================================================================
// Tests
// =============================================================================
