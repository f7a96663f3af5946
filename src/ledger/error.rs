// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger error taxonomy.
//!
//! Every rejected operation returns exactly one [`LedgerError`] and leaves
//! ledger state untouched. Each kind carries the numeric code the on-chain
//! contract used, so remote callers can keep their existing error tables.

use super::token::TokenError;
use crate::models::MemoTooLong;

/// Error returned by a rejected ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Zero amount, invalid ratio, oversized memo, timelock not elapsed, ...
    #[error("precondition failed: {0}")]
    PreconditionFailed(&'static str),

    #[error("caller is not the contract manager")]
    NotManager,

    #[error("caller is not the sponsor operator")]
    UnauthorizedSponsorOperator,

    #[error("caller is not authorized to withdraw this treasury")]
    UnauthorizedFeeCollector,

    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u128, available: u128 },

    #[error("amount {amount} does not cover fee {fee}")]
    InsufficientFundsForFee { amount: u128, fee: u128 },

    #[error("insufficient treasury balance: requested {requested}, available {available}")]
    InsufficientFeeBalance { requested: u128, available: u128 },

    #[error("external token transfer failed: {0}")]
    ExternalTransferFailed(#[from] TokenError),
}

impl LedgerError {
    /// Numeric error code as defined by the on-chain contract.
    pub fn code(&self) -> u32 {
        match self {
            LedgerError::PreconditionFailed(_) => 1001,
            LedgerError::UnauthorizedSponsorOperator => 2002,
            LedgerError::NotManager => 2004,
            LedgerError::UnauthorizedFeeCollector => 2005,
            LedgerError::InsufficientFunds { .. } => 4001,
            LedgerError::InsufficientFundsForFee { .. } => 4002,
            LedgerError::InsufficientFeeBalance { .. } => 4003,
            LedgerError::ExternalTransferFailed(token) => token.code(),
        }
    }

    /// Stable snake_case identifier for API bodies and logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::PreconditionFailed(_) => "precondition_failed",
            LedgerError::NotManager => "not_manager",
            LedgerError::UnauthorizedSponsorOperator => "unauthorized_sponsor_operator",
            LedgerError::UnauthorizedFeeCollector => "unauthorized_fee_collector",
            LedgerError::InsufficientFunds { .. } => "insufficient_funds",
            LedgerError::InsufficientFundsForFee { .. } => "insufficient_funds_for_fee",
            LedgerError::InsufficientFeeBalance { .. } => "insufficient_fee_balance",
            LedgerError::ExternalTransferFailed(_) => "external_transfer_failed",
        }
    }
}

impl From<MemoTooLong> for LedgerError {
    fn from(_: MemoTooLong) -> Self {
        LedgerError::PreconditionFailed("memo exceeds 34 bytes")
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
