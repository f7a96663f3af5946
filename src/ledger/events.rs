// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger events.
//!
//! Every committed operation yields a [`Receipt`] describing what changed.
//! The service layer stamps it with a sequence number, id and timestamp to
//! form the [`LedgerEvent`] appended to the journal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::access::ProtocolRole;
use super::fees::FeeSplit;
use super::treasury::TreasuryKind;
use crate::models::{Amount, Memo, Principal};

/// The four transfer paths between external (stacks) and internal (bolt)
/// balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransferVariant {
    StacksToStacks,
    StacksToBolt,
    BoltToBolt,
    BoltToStacks,
}

impl TransferVariant {
    pub fn operation(&self) -> &'static str {
        match self {
            TransferVariant::StacksToStacks => "transfer-stacks-to-stacks",
            TransferVariant::StacksToBolt => "transfer-stacks-to-bolt",
            TransferVariant::BoltToBolt => "transfer-bolt-to-bolt",
            TransferVariant::BoltToStacks => "transfer-bolt-to-stacks",
        }
    }
}

/// What a committed operation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEventKind {
    RoleAssigned {
        role: ProtocolRole,
        principal: Principal,
    },
    GovernanceFeeRatioSet {
        ratio: u8,
    },
    BlocksToWithdrawSet {
        blocks: u64,
    },
    FeePaid {
        amount: Amount,
        split: FeeSplit,
    },
    TreasuryWithdrawn {
        treasury: TreasuryKind,
        amount: Amount,
        recipient: Principal,
    },
    TreasuryDeposited {
        treasury: TreasuryKind,
        amount: Amount,
    },
    Deposited {
        recipient: Principal,
        amount: Amount,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        memo: Option<Memo>,
    },
    Transferred {
        variant: TransferVariant,
        recipient: Principal,
        amount: Amount,
        fee: Amount,
        split: FeeSplit,
        /// Amount that reached the recipient.
        credited: Amount,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        memo: Option<Memo>,
    },
    WithdrawalRequested {
        amount: Amount,
        pending: Amount,
        unlock_height: u64,
    },
    WithdrawalClaimed {
        amount: Amount,
    },
    TokensMinted {
        recipient: Principal,
        amount: Amount,
    },
    ChainAdvanced {
        from: u64,
        to: u64,
    },
}

impl LedgerEventKind {
    /// Operation name as exposed by the contract interface.
    pub fn operation(&self) -> &'static str {
        match self {
            LedgerEventKind::RoleAssigned { role, .. } => match role {
                ProtocolRole::ContractManager => "set-contract-manager",
                ProtocolRole::SponsorOperator => "set-sponsor-operator",
                ProtocolRole::FeeCollectorOperator => "set-fee-collector-operator",
                ProtocolRole::GovernanceWithdrawer => "set-governance-withdrawer",
            },
            LedgerEventKind::GovernanceFeeRatioSet { .. } => "set-governance-fee-ratio",
            LedgerEventKind::BlocksToWithdrawSet { .. } => "set-blocks-to-withdraw",
            LedgerEventKind::FeePaid { .. } => "pay-fee",
            LedgerEventKind::TreasuryWithdrawn { treasury, .. } => match treasury {
                TreasuryKind::Governance => "withdraw-governance-treasury",
                TreasuryKind::Operator => "withdraw-operator-treasury",
            },
            LedgerEventKind::TreasuryDeposited { .. } => "deposit-governance-treasury",
            LedgerEventKind::Deposited { .. } => "deposit",
            LedgerEventKind::Transferred { variant, .. } => variant.operation(),
            LedgerEventKind::WithdrawalRequested { .. } => "request-withdrawal",
            LedgerEventKind::WithdrawalClaimed { .. } => "claim-withdrawal",
            LedgerEventKind::TokensMinted { .. } => "mint",
            LedgerEventKind::ChainAdvanced { .. } => "advance-chain",
        }
    }
}

/// Outcome of a committed ledger operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub kind: LedgerEventKind,
    /// Principals whose wallet or token balance changed.
    pub touched: Vec<Principal>,
}

impl Receipt {
    pub fn new(kind: LedgerEventKind) -> Self {
        Self {
            kind,
            touched: Vec::new(),
        }
    }

    pub fn touching<'a>(mut self, principals: impl IntoIterator<Item = &'a Principal>) -> Self {
        for principal in principals {
            if !self.touched.contains(principal) {
                self.touched.push(principal.clone());
            }
        }
        self
    }
}

/// Journal entry for one committed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LedgerEvent {
    /// Monotonic position in the journal, starting at 1.
    pub sequence: u64,
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub block_height: u64,
    pub sender: Principal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sponsor: Option<Principal>,
    pub kind: LedgerEventKind,
}

impl LedgerEvent {
    pub fn new(
        sequence: u64,
        block_height: u64,
        sender: Principal,
        sponsor: Option<Principal>,
        kind: LedgerEventKind,
    ) -> Self {
        Self {
            sequence,
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            block_height,
            sender,
            sponsor,
            kind,
        }
    }

    pub fn operation(&self) -> &'static str {
        self.kind.operation()
    }
}
