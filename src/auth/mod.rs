// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Caller Identification
//!
//! Signature checks and session handling happen upstream (wallet connector,
//! relay). By the time a request reaches this service the transport layer
//! has already authenticated the principal and forwards it in headers:
//!
//! - `X-Principal` - principal the call runs for (required for mutations)
//! - `X-Sponsor` - relay that submitted and pays for the call (optional)
//!
//! Role checks are not done here; they belong to the ledger, which knows
//! the current role holders.

pub mod error;
pub mod extractor;

pub use error::AuthError;
pub use extractor::{Caller, PRINCIPAL_HEADER, SPONSOR_HEADER};
