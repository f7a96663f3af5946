// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger service: the core ledger plus clock, journal and persistence.
//!
//! Every mutation runs through [`LedgerService::execute`], which stamps the
//! call with the current block height, runs the ledger operation, turns the
//! receipt into a [`LedgerEvent`] and persists the touched records together
//! with the event in one redb write transaction.
//!
//! ## Degraded mode
//!
//! If a commit fails the in-memory ledger is ahead of the database. The
//! service then refuses all further mutations until a restart reloads the
//! last committed state. Reads keep working.

use std::collections::VecDeque;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::chain::{BlockClock, ClockError, ClockMode};
use crate::ledger::{
    AccountLedger, CallContext, GovernanceConfig, InMemoryTokenLedger, Ledger, LedgerError,
    LedgerEvent, LedgerEventKind, LedgerResult, ProtocolRole, Receipt,
};
use crate::models::Principal;
use crate::storage::{CommitBatch, LedgerDb, LedgerDbError};

/// Ledger type served by this process.
pub type SimulatedLedger = Ledger<InMemoryTokenLedger>;

/// Upper bound for one page of the event journal.
pub const MAX_EVENT_PAGE: usize = 500;

/// Events kept by a service without a database. Older entries are dropped.
pub const MEMORY_JOURNAL_CAPACITY: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error("ledger storage is degraded, restart to reload the last committed state")]
    Degraded,

    #[error("storage error: {0}")]
    Storage(#[from] LedgerDbError),
}

/// Initial ledger parameters. Persisted state wins on restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    pub custody: Principal,
    pub contract_manager: Principal,
    pub governance_fee_ratio: u8,
    pub blocks_to_withdraw: u64,
    pub clock_mode: ClockMode,
}

impl LedgerSettings {
    fn governance(&self) -> GovernanceConfig {
        GovernanceConfig::new(
            self.contract_manager.clone(),
            self.governance_fee_ratio,
            self.blocks_to_withdraw,
        )
    }
}

pub struct LedgerService {
    ledger: SimulatedLedger,
    clock: BlockClock,
    db: Option<LedgerDb>,
    /// Newest events when there is no database, at most
    /// [`MEMORY_JOURNAL_CAPACITY`].
    journal: VecDeque<LedgerEvent>,
    /// Events evicted from `journal`.
    journal_dropped: u64,
    next_sequence: u64,
    degraded: bool,
}

impl LedgerService {
    /// Service without persistence.
    pub fn in_memory(settings: &LedgerSettings) -> Result<Self, ServiceError> {
        let ledger = Ledger::new(
            settings.custody.clone(),
            settings.governance(),
            InMemoryTokenLedger::new(),
        );
        let clock = BlockClock::resume(None, settings.clock_mode, Utc::now())?;
        Ok(Self {
            ledger,
            clock,
            db: None,
            journal: VecDeque::new(),
            journal_dropped: 0,
            next_sequence: 1,
            degraded: false,
        })
    }

    /// Service backed by `db`, restoring whatever it holds.
    pub fn open(settings: &LedgerSettings, db: LedgerDb) -> Result<Self, ServiceError> {
        let snapshot = db.load()?;
        let restored = snapshot.governance.is_some();

        let custody = match snapshot.custody {
            Some(saved) => {
                if saved != settings.custody {
                    warn!(
                        saved = %saved,
                        configured = %settings.custody,
                        "Configured custody principal differs from the database, keeping the saved one"
                    );
                }
                saved
            }
            None => settings.custody.clone(),
        };

        let ledger = Ledger::restore(
            custody,
            snapshot.governance.unwrap_or_else(|| settings.governance()),
            snapshot.treasuries,
            AccountLedger::from_wallets(snapshot.wallets),
            InMemoryTokenLedger::from_balances(snapshot.token_balances),
        );
        let clock = BlockClock::resume(snapshot.clock, settings.clock_mode, Utc::now())?;

        info!(
            restored,
            wallets = ledger.accounts().len(),
            last_sequence = snapshot.last_sequence,
            block_height = clock.height(),
            "Ledger state loaded"
        );

        Ok(Self {
            ledger,
            clock,
            db: Some(db),
            journal: VecDeque::new(),
            journal_dropped: 0,
            next_sequence: snapshot.last_sequence + 1,
            degraded: false,
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn ledger(&self) -> &SimulatedLedger {
        &self.ledger
    }

    pub fn clock(&self) -> &BlockClock {
        &self.clock
    }

    pub fn block_height(&self) -> u64 {
        self.clock.height()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn is_persistent(&self) -> bool {
        self.db.is_some()
    }

    /// Page of the journal in sequence order, plus the total count.
    ///
    /// Without a database only the newest [`MEMORY_JOURNAL_CAPACITY`] events
    /// are retained; offsets pointing at evicted events start the page at
    /// the oldest retained one. The total still counts every event.
    pub fn events(&self, offset: u64, limit: usize) -> Result<(Vec<LedgerEvent>, u64), ServiceError> {
        let limit = limit.min(MAX_EVENT_PAGE);
        match &self.db {
            Some(db) => Ok(db.list_events(offset, limit)?),
            None => {
                let skip = offset.saturating_sub(self.journal_dropped);
                let start = usize::try_from(skip).unwrap_or(usize::MAX);
                let page = self
                    .journal
                    .iter()
                    .skip(start)
                    .take(limit)
                    .cloned()
                    .collect();
                Ok((page, self.journal_dropped + self.journal.len() as u64))
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Run one ledger operation and commit its event.
    pub fn execute<F>(
        &mut self,
        operation: &'static str,
        sender: Principal,
        sponsor: Option<Principal>,
        op: F,
    ) -> Result<LedgerEvent, ServiceError>
    where
        F: FnOnce(&mut SimulatedLedger, &CallContext) -> LedgerResult<Receipt>,
    {
        if self.degraded {
            return Err(ServiceError::Degraded);
        }

        let ctx = CallContext {
            sender,
            sponsor,
            block_height: self.clock.height(),
        };

        let receipt = match op(&mut self.ledger, &ctx) {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!(
                    operation,
                    sender = %ctx.sender,
                    error_code = err.error_code(),
                    code = err.code(),
                    error = %err,
                    "Ledger operation rejected"
                );
                return Err(err.into());
            }
        };

        self.record(ctx, receipt)
    }

    /// Move the manual clock forward. Manager-only.
    pub fn advance_chain(
        &mut self,
        sender: Principal,
        blocks: u64,
    ) -> Result<LedgerEvent, ServiceError> {
        if self.degraded {
            return Err(ServiceError::Degraded);
        }
        self.ledger
            .config()
            .authorize(&sender, ProtocolRole::ContractManager)?;

        let (from, to) = self.clock.advance(blocks)?;
        let ctx = CallContext::new(sender, to);
        self.record(ctx, Receipt::new(LedgerEventKind::ChainAdvanced { from, to }))
    }

    fn record(&mut self, ctx: CallContext, receipt: Receipt) -> Result<LedgerEvent, ServiceError> {
        let event = LedgerEvent::new(
            self.next_sequence,
            ctx.block_height,
            ctx.sender,
            ctx.sponsor,
            receipt.kind,
        );

        if let Err(err) = self.persist(&event, &receipt.touched) {
            self.degraded = true;
            error!(
                sequence = event.sequence,
                operation = event.operation(),
                error = %err,
                "Failed to persist ledger event, refusing further writes"
            );
            return Err(err.into());
        }

        self.next_sequence += 1;
        info!(
            sequence = event.sequence,
            operation = event.operation(),
            sender = %event.sender,
            sponsor = event.sponsor.as_ref().map(Principal::as_str),
            block_height = event.block_height,
            touched = receipt.touched.len(),
            "Ledger operation committed"
        );
        Ok(event)
    }

    fn persist(&mut self, event: &LedgerEvent, touched: &[Principal]) -> Result<(), LedgerDbError> {
        let Some(db) = &self.db else {
            if self.journal.len() == MEMORY_JOURNAL_CAPACITY {
                self.journal.pop_front();
                self.journal_dropped += 1;
            }
            self.journal.push_back(event.clone());
            return Ok(());
        };

        let accounts = self.ledger.accounts();
        let wallets = touched
            .iter()
            .filter(|p| accounts.contains(p))
            .map(|p| (p.clone(), accounts.get(p)))
            .collect();
        let token_balances = touched
            .iter()
            .map(|p| (p.clone(), self.ledger.token_balance(p)))
            .collect();

        db.commit(&CommitBatch {
            custody: self.ledger.custody(),
            governance: self.ledger.config(),
            treasuries: self.ledger.treasuries(),
            clock: &self.clock,
            wallets,
            token_balances,
            event,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TokenGateway;

    fn p(s: &str) -> Principal {
        Principal::parse(s).unwrap()
    }

    fn manager() -> Principal {
        p("ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM")
    }

    fn alice() -> Principal {
        p("ST1SJ3DTE5DN7X54YDH5D64R3BCB6A2AG2ZQ8YPD5")
    }

    fn settings() -> LedgerSettings {
        LedgerSettings {
            custody: p("SP3QZNX3CGT6V7PE1PBK17FCRK1TP1AT02ZHQCMVJ.boltproto-sbtc"),
            contract_manager: manager(),
            governance_fee_ratio: 30,
            blocks_to_withdraw: 10,
            clock_mode: ClockMode::Manual,
        }
    }

    fn fund(service: &mut LedgerService, amount: u128) {
        service
            .execute("mint", manager(), None, |ledger, ctx| {
                ledger.mint_tokens(ctx, amount, alice())
            })
            .unwrap();
        service
            .execute("deposit", alice(), None, |ledger, ctx| {
                ledger.deposit(ctx, amount, alice(), None)
            })
            .unwrap();
    }

    #[test]
    fn execute_journals_committed_operations() {
        let mut service = LedgerService::in_memory(&settings()).unwrap();
        fund(&mut service, 5_000);

        let (events, total) = service.events(0, 10).unwrap();
        assert_eq!(total, 2);
        assert_eq!(events[0].sequence, 1);
        assert_eq!(events[1].operation(), "deposit");
        assert_eq!(events[1].block_height, 1);
        assert_eq!(service.ledger().wallet(&alice()).balance, 5_000);
    }

    #[test]
    fn rejected_operations_are_not_journaled() {
        let mut service = LedgerService::in_memory(&settings()).unwrap();
        let err = service
            .execute("set-governance-fee-ratio", alice(), None, |ledger, ctx| {
                ledger.set_governance_fee_ratio(ctx, 50)
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Ledger(LedgerError::NotManager)));
        assert_eq!(service.events(0, 10).unwrap().1, 0);
    }

    #[test]
    fn advance_chain_unlocks_withdrawals() {
        let mut service = LedgerService::in_memory(&settings()).unwrap();
        fund(&mut service, 5_000);
        service
            .execute("request-withdrawal", alice(), None, |ledger, ctx| {
                ledger.request_withdrawal(ctx, 1_000)
            })
            .unwrap();

        assert!(matches!(
            service.advance_chain(alice(), 10),
            Err(ServiceError::Ledger(LedgerError::NotManager))
        ));
        let event = service.advance_chain(manager(), 10).unwrap();
        assert_eq!(event.kind, LedgerEventKind::ChainAdvanced { from: 1, to: 11 });

        service
            .execute("claim-withdrawal", alice(), None, |ledger, ctx| {
                ledger.claim_withdrawal(ctx)
            })
            .unwrap();
        assert_eq!(service.ledger().token_balance(&alice()), 1_000);
    }

    #[test]
    fn degraded_service_refuses_writes() {
        let mut service = LedgerService::in_memory(&settings()).unwrap();
        service.degraded = true;

        assert!(matches!(
            service.execute("deposit", alice(), None, |ledger, ctx| {
                ledger.deposit(ctx, 1, alice(), None)
            }),
            Err(ServiceError::Degraded)
        ));
        assert!(matches!(
            service.advance_chain(manager(), 1),
            Err(ServiceError::Degraded)
        ));
    }

    #[test]
    fn event_page_is_capped() {
        let service = LedgerService::in_memory(&settings()).unwrap();
        let (events, total) = service.events(0, usize::MAX).unwrap();
        assert!(events.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn saved_custody_wins_over_configured_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.redb");

        {
            let db = LedgerDb::open(&path).unwrap();
            let mut service = LedgerService::open(&settings(), db).unwrap();
            fund(&mut service, 5_000);
            service
                .execute("request-withdrawal", alice(), None, |ledger, ctx| {
                    ledger.request_withdrawal(ctx, 5_000)
                })
                .unwrap();
        }

        let moved = LedgerSettings {
            custody: p("SP3QZNX3CGT6V7PE1PBK17FCRK1TP1AT02ZHQCMVJ.other-custody"),
            ..settings()
        };
        let db = LedgerDb::open(&path).unwrap();
        let mut service = LedgerService::open(&moved, db).unwrap();
        assert_eq!(service.ledger().custody(), &settings().custody);

        let report = service.ledger().custody_report();
        assert_eq!(report.held, 5_000);
        assert_eq!(report.wallet_liabilities, 5_000);
        assert_eq!(report.shortfall, 0);

        service.advance_chain(manager(), 10).unwrap();
        service
            .execute("claim-withdrawal", alice(), None, |ledger, ctx| {
                ledger.claim_withdrawal(ctx)
            })
            .unwrap();
        assert_eq!(service.ledger().token_balance(&alice()), 5_000);
    }

    #[test]
    fn memory_journal_keeps_newest_events() {
        let mut service = LedgerService::in_memory(&settings()).unwrap();
        let committed = MEMORY_JOURNAL_CAPACITY as u64 + 5;
        for blocks in 1..=committed {
            service
                .execute("set-blocks-to-withdraw", manager(), None, |ledger, ctx| {
                    ledger.set_blocks_to_withdraw(ctx, blocks)
                })
                .unwrap();
        }

        assert_eq!(service.journal.len(), MEMORY_JOURNAL_CAPACITY);
        let (events, total) = service.events(0, 2).unwrap();
        assert_eq!(total, committed);
        assert_eq!(events[0].sequence, 6);

        let (events, _) = service.events(committed - 1, 10).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sequence, committed);
    }

    #[test]
    fn persisted_state_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.redb");

        {
            let db = LedgerDb::open(&path).unwrap();
            let mut service = LedgerService::open(&settings(), db).unwrap();
            fund(&mut service, 5_000);
            service
                .execute("set-blocks-to-withdraw", manager(), None, |ledger, ctx| {
                    ledger.set_blocks_to_withdraw(ctx, 3)
                })
                .unwrap();
            service.advance_chain(manager(), 4).unwrap();
        }

        let db = LedgerDb::open(&path).unwrap();
        let mut service = LedgerService::open(&settings(), db).unwrap();
        assert!(service.is_persistent());
        assert_eq!(service.block_height(), 5);
        assert_eq!(service.ledger().blocks_to_withdraw(), 3);
        assert_eq!(service.ledger().wallet(&alice()).balance, 5_000);
        assert_eq!(service.ledger().token().total_supply(), 5_000);
        assert_eq!(
            service.ledger().token().get_balance(service.ledger().custody()),
            5_000
        );

        let event = service
            .execute("request-withdrawal", alice(), None, |ledger, ctx| {
                ledger.request_withdrawal(ctx, 100)
            })
            .unwrap();
        assert_eq!(event.sequence, 5);

        let (events, total) = service.events(3, 10).unwrap();
        assert_eq!(total, 5);
        assert_eq!(
            events.iter().map(|e| e.sequence).collect::<Vec<_>>(),
            vec![4, 5]
        );
    }
}
