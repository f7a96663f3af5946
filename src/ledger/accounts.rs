// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-principal wallet records.
//!
//! ## Withdrawal Sub-State
//!
//! ```text
//!            request                     claim (timelock elapsed)
//!   Idle ─────────────► Requested ─────────────────────────────► Idle
//!                        │    ▲
//!                        └────┘ request again: amount accumulates,
//!                               clock restarts at the latest block
//! ```
//!
//! Pending funds stay spendable: [`debit_spendable`] draws from `balance`
//! first and only then from `withdraw_requested_amount`. A wallet whose
//! pending amount is drained to zero this way falls back to `Idle`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::{LedgerError, LedgerResult};
use crate::models::{Amount, Principal};

/// Ledger record for one principal (`get-wallet-data`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub struct Wallet {
    /// Freely spendable balance.
    pub balance: Amount,
    /// Amount moved out of `balance` by withdrawal requests.
    pub withdraw_requested_amount: Amount,
    /// Block of the latest withdrawal request (0 when idle).
    pub withdraw_requested_block: u64,
}

/// Withdrawal progress derived from a [`Wallet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum WithdrawalState {
    Idle,
    Requested { amount: Amount, requested_at: u64 },
}

impl Wallet {
    /// `balance + withdraw_requested_amount`.
    pub fn spendable(&self) -> Amount {
        self.balance.saturating_add(self.withdraw_requested_amount)
    }

    pub fn is_withdrawal_pending(&self) -> bool {
        self.withdraw_requested_amount > 0
    }

    pub fn withdrawal_state(&self) -> WithdrawalState {
        if self.is_withdrawal_pending() {
            WithdrawalState::Requested {
                amount: self.withdraw_requested_amount,
                requested_at: self.withdraw_requested_block,
            }
        } else {
            WithdrawalState::Idle
        }
    }

    /// First block at which the pending withdrawal may be claimed.
    pub fn unlock_height(&self, blocks_to_withdraw: u64) -> Option<u64> {
        self.is_withdrawal_pending()
            .then(|| self.withdraw_requested_block.saturating_add(blocks_to_withdraw))
    }

    pub fn credit(&mut self, amount: Amount) -> LedgerResult<()> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::PreconditionFailed("wallet balance overflow"))?;
        Ok(())
    }

    /// Move `amount` from `balance` into the pending withdrawal.
    pub fn request_withdrawal(&mut self, amount: Amount, current_block: u64) -> LedgerResult<()> {
        if amount == 0 {
            return Err(LedgerError::PreconditionFailed(
                "withdrawal amount must be positive",
            ));
        }
        if amount > self.balance {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            });
        }

        self.balance -= amount;
        // bounded by total balance, cannot overflow
        self.withdraw_requested_amount += amount;
        self.withdraw_requested_block = current_block;
        Ok(())
    }

    /// Release the pending withdrawal once the timelock has elapsed.
    ///
    /// Returns the amount to pay out. The wallet returns to idle.
    pub fn claim_withdrawal(
        &mut self,
        current_block: u64,
        blocks_to_withdraw: u64,
    ) -> LedgerResult<Amount> {
        let Some(unlock_height) = self.unlock_height(blocks_to_withdraw) else {
            return Err(LedgerError::InsufficientFunds {
                requested: 0,
                available: 0,
            });
        };
        if current_block < unlock_height {
            return Err(LedgerError::PreconditionFailed(
                "withdrawal timelock has not elapsed",
            ));
        }

        let amount = self.withdraw_requested_amount;
        self.withdraw_requested_amount = 0;
        self.withdraw_requested_block = 0;
        Ok(amount)
    }
}

/// Debit `amount` from `balance`, then from the pending withdrawal.
///
/// Shared by every transfer path so the draw order is identical everywhere.
/// On failure the wallet is left unchanged.
pub fn debit_spendable(wallet: &mut Wallet, amount: Amount) -> LedgerResult<()> {
    let available = wallet.spendable();
    if amount > available {
        return Err(LedgerError::InsufficientFunds {
            requested: amount,
            available,
        });
    }

    let from_balance = amount.min(wallet.balance);
    let from_pending = amount - from_balance;

    wallet.balance -= from_balance;
    wallet.withdraw_requested_amount -= from_pending;
    if wallet.withdraw_requested_amount == 0 {
        wallet.withdraw_requested_block = 0;
    }
    Ok(())
}

/// All wallet records, created lazily on first credit.
#[derive(Debug, Clone, Default)]
pub struct AccountLedger {
    wallets: HashMap<Principal, Wallet>,
}

impl AccountLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_wallets(wallets: impl IntoIterator<Item = (Principal, Wallet)>) -> Self {
        Self {
            wallets: wallets.into_iter().collect(),
        }
    }

    /// Wallet for `owner`; unknown principals read as the zero record.
    pub fn get(&self, owner: &Principal) -> Wallet {
        self.wallets.get(owner).copied().unwrap_or_default()
    }

    pub fn put(&mut self, owner: Principal, wallet: Wallet) {
        self.wallets.insert(owner, wallet);
    }

    /// Whether `owner` has ever been credited.
    pub fn contains(&self, owner: &Principal) -> bool {
        self.wallets.contains_key(owner)
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    /// Sum of every balance and pending withdrawal.
    pub fn total_liabilities(&self) -> Amount {
        self.wallets
            .values()
            .fold(0u128, |acc, w| acc.saturating_add(w.spendable()))
    }
}
