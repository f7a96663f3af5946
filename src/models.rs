// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Shared Data Models
//!
//! Value types used by both the ledger core and the REST API. All types
//! derive `Serialize`, `Deserialize` and `ToSchema` so they can travel over
//! the wire and show up in the OpenAPI document unchanged.
//!
//! ## Principal Type
//!
//! The [`Principal`] newtype wraps a Stacks principal: either a standard
//! address (`ST1PQ...GZGM`) or a contract principal (`SP3QZ...CMVJ.boltproto-sbtc`).
//! Parsing validates the c32 alphabet and the contract name so malformed
//! identifiers never reach the ledger.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Token amount in the smallest unit (satoshis for sBTC).
pub type Amount = u128;

/// Maximum memo length in bytes, matching the token standard's memo buffer.
pub const MEMO_MAX_LEN: usize = 34;

/// Crockford-style c32 alphabet used by Stacks addresses.
const C32_ALPHABET: &str = "0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Maximum contract name length accepted by Clarity.
const CONTRACT_NAME_MAX_LEN: usize = 128;

// =============================================================================
// Principal
// =============================================================================

/// Reasons a principal string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrincipalError {
    #[error("principal is empty")]
    Empty,

    #[error("principal address must start with 'S' followed by a c32 version character")]
    InvalidPrefix,

    #[error("principal address has invalid length {0}")]
    InvalidLength(usize),

    #[error("principal address contains non-c32 character '{0}'")]
    InvalidCharacter(char),

    #[error("contract name '{0}' is invalid")]
    InvalidContractName(String),
}

/// Stacks principal (standard or contract).
///
/// # Example
///
/// ```rust,ignore
/// let owner: Principal = "ST1SJ3DTE5DN7X54YDH5D64R3BCB6A2AG2ZQ8YPD5".parse()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "ST1SJ3DTE5DN7X54YDH5D64R3BCB6A2AG2ZQ8YPD5")]
pub struct Principal(String);

impl Principal {
    /// Parse and validate a principal.
    pub fn parse(value: &str) -> Result<Self, PrincipalError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(PrincipalError::Empty);
        }

        let (address, contract) = match value.split_once('.') {
            Some((address, contract)) => (address, Some(contract)),
            None => (value, None),
        };

        validate_address(address)?;
        if let Some(name) = contract {
            validate_contract_name(name)?;
        }

        Ok(Self(value.to_string()))
    }

    /// The principal as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a contract principal (`address.name`).
    pub fn is_contract(&self) -> bool {
        self.0.contains('.')
    }
}

fn validate_address(address: &str) -> Result<(), PrincipalError> {
    let mut chars = address.chars();
    match (chars.next(), chars.next()) {
        (Some('S'), Some(version)) if C32_ALPHABET.contains(version) => {}
        _ => return Err(PrincipalError::InvalidPrefix),
    }

    // 'S' + version + 26..=39 c32 characters of hash160 and checksum
    if !(28..=41).contains(&address.len()) {
        return Err(PrincipalError::InvalidLength(address.len()));
    }

    if let Some(bad) = address[2..].chars().find(|c| !C32_ALPHABET.contains(*c)) {
        return Err(PrincipalError::InvalidCharacter(bad));
    }

    Ok(())
}

fn validate_contract_name(name: &str) -> Result<(), PrincipalError> {
    let starts_alpha = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if !starts_alpha || !valid_chars || name.len() > CONTRACT_NAME_MAX_LEN {
        return Err(PrincipalError::InvalidContractName(name.to_string()));
    }
    Ok(())
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = PrincipalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Principal> for String {
    fn from(value: Principal) -> Self {
        value.0
    }
}

// =============================================================================
// Memo
// =============================================================================

/// Memo longer than [`MEMO_MAX_LEN`] bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("memo is {0} bytes, maximum is {max}", max = MEMO_MAX_LEN)]
pub struct MemoTooLong(pub usize);

/// Free-form transfer memo. Informational only, never affects balances.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "invoice 42")]
pub struct Memo(String);

impl Memo {
    pub fn new(text: impl Into<String>) -> Result<Self, MemoTooLong> {
        let text = text.into();
        if text.len() > MEMO_MAX_LEN {
            return Err(MemoTooLong(text.len()));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Memo {
    type Error = MemoTooLong;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Memo> for String {
    fn from(value: Memo) -> Self {
        value.0
    }
}
