// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fungible token gateway.
//!
//! The ledger never owns token balances itself: it asks a [`TokenGateway`]
//! to move tokens between external holders and its custody principal.
//! [`InMemoryTokenLedger`] is the simulated sBTC token used by tests and by
//! the server when no chain connection is configured.

use std::collections::HashMap;

use crate::models::{Amount, Principal};

/// Token-level failure. Codes follow the SIP-010 `ft-transfer?` errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("insufficient token balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Amount, available: Amount },

    #[error("sender and recipient are the same principal")]
    SenderIsRecipient,

    #[error("token amount must be positive")]
    NonPositiveAmount,

    #[error("token supply overflow")]
    SupplyOverflow,
}

impl TokenError {
    pub fn code(&self) -> u32 {
        match self {
            TokenError::InsufficientBalance { .. } => 1,
            TokenError::SenderIsRecipient => 2,
            TokenError::NonPositiveAmount => 3,
            TokenError::SupplyOverflow => 4,
        }
    }
}

/// Capability to move the underlying fungible token.
pub trait TokenGateway {
    /// Create `amount` new tokens for `recipient`.
    fn mint(&mut self, amount: Amount, recipient: &Principal) -> Result<(), TokenError>;

    /// Move `amount` from `from` to `to`.
    fn transfer(&mut self, amount: Amount, from: &Principal, to: &Principal)
        -> Result<(), TokenError>;

    /// Current balance of `owner` (zero for unknown holders).
    fn get_balance(&self, owner: &Principal) -> Amount;
}

/// In-memory token ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenLedger {
    balances: HashMap<Principal, Amount>,
    total_supply: Amount,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted balances.
    pub fn from_balances(balances: impl IntoIterator<Item = (Principal, Amount)>) -> Self {
        let balances: HashMap<Principal, Amount> = balances.into_iter().collect();
        let total_supply = balances
            .values()
            .fold(0u128, |acc, v| acc.saturating_add(*v));
        Self {
            balances,
            total_supply,
        }
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }
}

impl TokenGateway for InMemoryTokenLedger {
    fn mint(&mut self, amount: Amount, recipient: &Principal) -> Result<(), TokenError> {
        if amount == 0 {
            return Err(TokenError::NonPositiveAmount);
        }
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow)?;

        *self.balances.entry(recipient.clone()).or_default() += amount;
        self.total_supply = total_supply;
        Ok(())
    }

    fn transfer(
        &mut self,
        amount: Amount,
        from: &Principal,
        to: &Principal,
    ) -> Result<(), TokenError> {
        if amount == 0 {
            return Err(TokenError::NonPositiveAmount);
        }
        if from == to {
            return Err(TokenError::SenderIsRecipient);
        }

        let available = self.get_balance(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                requested: amount,
                available,
            });
        }

        // total supply is conserved, so the credit cannot overflow
        self.balances.insert(from.clone(), available - amount);
        *self.balances.entry(to.clone()).or_default() += amount;
        Ok(())
    }

    fn get_balance(&self, owner: &Principal) -> Amount {
        self.balances.get(owner).copied().unwrap_or(0)
    }
}
