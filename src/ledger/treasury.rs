// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Governance and operator fee treasuries.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::access::ProtocolRole;
use super::error::{LedgerError, LedgerResult};
use super::fees::FeeSplit;
use crate::models::Amount;

/// Which treasury an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TreasuryKind {
    Governance,
    Operator,
}

impl TreasuryKind {
    /// Role allowed to withdraw from this treasury.
    pub fn withdrawer_role(&self) -> ProtocolRole {
        match self {
            TreasuryKind::Governance => ProtocolRole::GovernanceWithdrawer,
            TreasuryKind::Operator => ProtocolRole::FeeCollectorOperator,
        }
    }
}

/// Accumulated fee balances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Treasuries {
    pub governance_treasury: Amount,
    pub operator_treasury: Amount,
}

impl Treasuries {
    pub fn balance(&self, kind: TreasuryKind) -> Amount {
        match kind {
            TreasuryKind::Governance => self.governance_treasury,
            TreasuryKind::Operator => self.operator_treasury,
        }
    }

    pub fn total(&self) -> Amount {
        self.governance_treasury
            .saturating_add(self.operator_treasury)
    }

    /// Treasuries after crediting both shares of a fee.
    pub fn with_fee(&self, split: FeeSplit) -> LedgerResult<Self> {
        Ok(Self {
            governance_treasury: checked_credit(self.governance_treasury, split.governance)?,
            operator_treasury: checked_credit(self.operator_treasury, split.operator)?,
        })
    }

    /// Treasuries after crediting `amount` to one side only.
    pub fn with_credit(&self, kind: TreasuryKind, amount: Amount) -> LedgerResult<Self> {
        let mut next = *self;
        let slot = next.slot(kind);
        *slot = checked_credit(*slot, amount)?;
        Ok(next)
    }

    /// Treasuries after debiting `amount` from one side.
    pub fn with_debit(&self, kind: TreasuryKind, amount: Amount) -> LedgerResult<Self> {
        let available = self.balance(kind);
        if amount > available {
            return Err(LedgerError::InsufficientFeeBalance {
                requested: amount,
                available,
            });
        }
        let mut next = *self;
        *next.slot(kind) = available - amount;
        Ok(next)
    }

    fn slot(&mut self, kind: TreasuryKind) -> &mut Amount {
        match kind {
            TreasuryKind::Governance => &mut self.governance_treasury,
            TreasuryKind::Operator => &mut self.operator_treasury,
        }
    }
}

fn checked_credit(balance: Amount, amount: Amount) -> LedgerResult<Amount> {
    balance
        .checked_add(amount)
        .ok_or(LedgerError::PreconditionFailed("treasury balance overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_credits_both_sides() {
        let t = Treasuries::default()
            .with_fee(FeeSplit { governance: 3, operator: 7 })
            .unwrap();
        assert_eq!(t.governance_treasury, 3);
        assert_eq!(t.operator_treasury, 7);
        assert_eq!(t.total(), 10);
    }

    #[test]
    fn debit_beyond_balance_fails() {
        let t = Treasuries {
            governance_treasury: 300_000,
            operator_treasury: 700_000,
        };
        assert_eq!(
            t.with_debit(TreasuryKind::Governance, 301_000),
            Err(LedgerError::InsufficientFeeBalance {
                requested: 301_000,
                available: 300_000
            })
        );

        let after = t.with_debit(TreasuryKind::Operator, 350_000).unwrap();
        assert_eq!(after.operator_treasury, 350_000);
        assert_eq!(after.governance_treasury, 300_000);
    }

    #[test]
    fn direct_credit_bypasses_split() {
        let t = Treasuries::default()
            .with_credit(TreasuryKind::Governance, 1_000_000)
            .unwrap();
        assert_eq!(t.governance_treasury, 1_000_000);
        assert_eq!(t.operator_treasury, 0);
    }

    #[test]
    fn withdrawer_roles() {
        assert_eq!(
            TreasuryKind::Governance.withdrawer_role(),
            ProtocolRole::GovernanceWithdrawer
        );
        assert_eq!(
            TreasuryKind::Operator.withdrawer_role(),
            ProtocolRole::FeeCollectorOperator
        );
    }
}
