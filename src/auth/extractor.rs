// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the calling principal.
//!
//! ```rust,ignore
//! async fn deposit(caller: Caller, State(state): State<AppState>) -> ... {
//!     // caller.principal, caller.sponsor
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use super::AuthError;
use crate::models::Principal;

/// Header carrying the authenticated principal.
pub const PRINCIPAL_HEADER: &str = "x-principal";

/// Header carrying the optional sponsoring relay.
pub const SPONSOR_HEADER: &str = "x-sponsor";

/// Identity of the caller as forwarded by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub principal: Principal,
    pub sponsor: Option<Principal>,
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = header_value(&parts.headers, PRINCIPAL_HEADER)
            .map_err(AuthError::InvalidPrincipal)?
            .ok_or(AuthError::MissingPrincipal)?;
        let principal = Principal::parse(principal)
            .map_err(|e| AuthError::InvalidPrincipal(e.to_string()))?;

        let sponsor = match header_value(&parts.headers, SPONSOR_HEADER)
            .map_err(AuthError::InvalidSponsor)?
        {
            Some(raw) => Some(
                Principal::parse(raw).map_err(|e| AuthError::InvalidSponsor(e.to_string()))?,
            ),
            None => None,
        };

        Ok(Caller { principal, sponsor })
    }
}

/// Non-empty header value, `Ok(None)` when absent or blank.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, String> {
    match headers.get(name) {
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| "header is not valid ASCII".to_string())?
                .trim();
            Ok((!value.is_empty()).then_some(value))
        }
        None => Ok(None),
    }
}
