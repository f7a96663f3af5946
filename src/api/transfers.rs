// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fee-bearing transfers.
//!
//! "stacks" is a principal's external token balance, "bolt" its ledger
//! wallet. Every variant except stacks-to-stacks must be submitted by the
//! sponsor operator, either directly or through the `X-Sponsor` header.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{execute, parse_memo, MutationResponse};
use crate::{
    auth::Caller,
    error::ApiError,
    models::{Amount, Principal},
    state::AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferRequest {
    pub amount: Amount,
    pub recipient: Principal,
    /// At most 34 bytes.
    #[serde(default)]
    pub memo: Option<String>,
    /// Fee charged on top of (or out of) `amount`, split between the treasuries.
    #[serde(default)]
    pub fee: Amount,
}

/// External balance to external balance; the sender pays `amount + fee`.
#[utoipa::path(
    post,
    path = "/v1/transfers/stacks-to-stacks",
    tag = "Transfers",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer settled", body = MutationResponse),
        (status = 400, description = "Zero amount, self transfer or memo too long", body = crate::error::ErrorBody),
        (status = 502, description = "Token transfer failed", body = crate::error::ErrorBody)
    )
)]
pub async fn transfer_stacks_to_stacks(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let memo = parse_memo(request.memo)?;
    execute(&state, "transfer-stacks-to-stacks", caller, |ledger, ctx| {
        ledger.transfer_stacks_to_stacks(ctx, request.amount, request.recipient, memo, request.fee)
    })
    .await
}

/// External balance into a ledger wallet; the recipient receives `amount - fee`.
#[utoipa::path(
    post,
    path = "/v1/transfers/stacks-to-bolt",
    tag = "Transfers",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer settled", body = MutationResponse),
        (status = 403, description = "Not submitted by the sponsor operator", body = crate::error::ErrorBody),
        (status = 409, description = "Amount does not cover the fee", body = crate::error::ErrorBody),
        (status = 502, description = "Token transfer failed", body = crate::error::ErrorBody)
    )
)]
pub async fn transfer_stacks_to_bolt(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let memo = parse_memo(request.memo)?;
    execute(&state, "transfer-stacks-to-bolt", caller, |ledger, ctx| {
        ledger.transfer_stacks_to_bolt(ctx, request.amount, request.recipient, memo, request.fee)
    })
    .await
}

/// Ledger wallet to ledger wallet; the sender is debited `amount + fee`.
#[utoipa::path(
    post,
    path = "/v1/transfers/bolt-to-bolt",
    tag = "Transfers",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer settled", body = MutationResponse),
        (status = 403, description = "Not submitted by the sponsor operator", body = crate::error::ErrorBody),
        (status = 409, description = "Wallet balance too low", body = crate::error::ErrorBody)
    )
)]
pub async fn transfer_bolt_to_bolt(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let memo = parse_memo(request.memo)?;
    execute(&state, "transfer-bolt-to-bolt", caller, |ledger, ctx| {
        ledger.transfer_bolt_to_bolt(ctx, request.amount, request.recipient, memo, request.fee)
    })
    .await
}

/// Ledger wallet out to an external balance; pays `amount - fee` from custody.
#[utoipa::path(
    post,
    path = "/v1/transfers/bolt-to-stacks",
    tag = "Transfers",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer settled", body = MutationResponse),
        (status = 403, description = "Not submitted by the sponsor operator", body = crate::error::ErrorBody),
        (status = 409, description = "Wallet balance too low or amount does not cover the fee", body = crate::error::ErrorBody),
        (status = 502, description = "Token transfer failed", body = crate::error::ErrorBody)
    )
)]
pub async fn transfer_bolt_to_stacks(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let memo = parse_memo(request.memo)?;
    execute(&state, "transfer-bolt-to-stacks", caller, |ledger, ctx| {
        ledger.transfer_bolt_to_stacks(ctx, request.amount, request.recipient, memo, request.fee)
    })
    .await
}
