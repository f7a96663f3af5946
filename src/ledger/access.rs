// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Protocol roles and governance configuration.
//!
//! ## Roles
//!
//! - `ContractManager` - reassigns every role (itself included) and tunes
//!   the fee ratio and withdrawal timelock
//! - `SponsorOperator` - relays sponsored and internal transfers
//! - `FeeCollectorOperator` - withdraws the operator treasury
//! - `GovernanceWithdrawer` - withdraws the governance treasury
//!
//! Authorization is a pure function of the caller and the current
//! [`GovernanceConfig`]; nothing here touches balances.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::{LedgerError, LedgerResult};
use crate::models::Principal;

/// Upper bound (inclusive) of the governance fee ratio, in percent.
pub const MAX_GOVERNANCE_FEE_RATIO: u8 = 100;

/// Privileged protocol roles. Each is held by exactly one principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolRole {
    ContractManager,
    SponsorOperator,
    FeeCollectorOperator,
    GovernanceWithdrawer,
}

impl ProtocolRole {
    /// Error returned when a caller lacks this role.
    fn denial(&self) -> LedgerError {
        match self {
            ProtocolRole::ContractManager => LedgerError::NotManager,
            ProtocolRole::SponsorOperator => LedgerError::UnauthorizedSponsorOperator,
            ProtocolRole::FeeCollectorOperator | ProtocolRole::GovernanceWithdrawer => {
                LedgerError::UnauthorizedFeeCollector
            }
        }
    }
}

impl fmt::Display for ProtocolRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolRole::ContractManager => write!(f, "contract-manager"),
            ProtocolRole::SponsorOperator => write!(f, "sponsor-operator"),
            ProtocolRole::FeeCollectorOperator => write!(f, "fee-collector-operator"),
            ProtocolRole::GovernanceWithdrawer => write!(f, "governance-withdrawer"),
        }
    }
}

/// Role holders plus the tunable fee/timelock parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GovernanceConfig {
    pub contract_manager: Principal,
    pub sponsor_operator: Principal,
    pub fee_collector_operator: Principal,
    pub governance_withdrawer: Principal,
    /// Governance share of every fee, in percent (0-100).
    pub governance_fee_ratio: u8,
    /// Blocks a withdrawal request must age before it can be claimed.
    pub blocks_to_withdraw: u64,
}

impl GovernanceConfig {
    /// Fresh configuration with `manager` holding all four roles.
    pub fn new(manager: Principal, governance_fee_ratio: u8, blocks_to_withdraw: u64) -> Self {
        Self {
            contract_manager: manager.clone(),
            sponsor_operator: manager.clone(),
            fee_collector_operator: manager.clone(),
            governance_withdrawer: manager,
            governance_fee_ratio: governance_fee_ratio.min(MAX_GOVERNANCE_FEE_RATIO),
            blocks_to_withdraw,
        }
    }

    /// Current holder of `role`.
    pub fn holder(&self, role: ProtocolRole) -> &Principal {
        match role {
            ProtocolRole::ContractManager => &self.contract_manager,
            ProtocolRole::SponsorOperator => &self.sponsor_operator,
            ProtocolRole::FeeCollectorOperator => &self.fee_collector_operator,
            ProtocolRole::GovernanceWithdrawer => &self.governance_withdrawer,
        }
    }

    /// Fail with the role's denial error unless `caller` holds `role`.
    pub fn authorize(&self, caller: &Principal, role: ProtocolRole) -> LedgerResult<()> {
        if self.holder(role) == caller {
            Ok(())
        } else {
            Err(role.denial())
        }
    }

    /// Reassign `role` to `principal`. Manager-only.
    pub fn assign(
        &mut self,
        caller: &Principal,
        role: ProtocolRole,
        principal: Principal,
    ) -> LedgerResult<()> {
        self.authorize(caller, ProtocolRole::ContractManager)?;
        let slot = match role {
            ProtocolRole::ContractManager => &mut self.contract_manager,
            ProtocolRole::SponsorOperator => &mut self.sponsor_operator,
            ProtocolRole::FeeCollectorOperator => &mut self.fee_collector_operator,
            ProtocolRole::GovernanceWithdrawer => &mut self.governance_withdrawer,
        };
        *slot = principal;
        Ok(())
    }

    /// Manager-only; ratios above 100 are rejected.
    pub fn set_governance_fee_ratio(&mut self, caller: &Principal, ratio: u8) -> LedgerResult<()> {
        self.authorize(caller, ProtocolRole::ContractManager)?;
        if ratio > MAX_GOVERNANCE_FEE_RATIO {
            return Err(LedgerError::PreconditionFailed(
                "governance fee ratio must be between 0 and 100",
            ));
        }
        self.governance_fee_ratio = ratio;
        Ok(())
    }

    /// Manager-only.
    pub fn set_blocks_to_withdraw(&mut self, caller: &Principal, blocks: u64) -> LedgerResult<()> {
        self.authorize(caller, ProtocolRole::ContractManager)?;
        self.blocks_to_withdraw = blocks;
        Ok(())
    }
}
