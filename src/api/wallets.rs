// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger wallet endpoints.
//!
//! A wallet is created implicitly by its first credit. Unknown principals
//! read as an all-zero wallet.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{execute, parse_memo, parse_principal, MutationResponse};
use crate::{
    auth::Caller,
    error::ApiError,
    ledger::{Wallet, WithdrawalState},
    models::{Amount, Principal},
    state::AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DepositRequest {
    pub amount: Amount,
    /// Wallet to credit. Defaults to the caller.
    #[serde(default)]
    pub recipient: Option<Principal>,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Wallet record plus derived withdrawal progress.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub struct WalletDataResponse {
    pub principal: Principal,
    #[serde(flatten)]
    pub wallet: Wallet,
    pub withdrawal: WithdrawalState,
    /// First block at which the pending withdrawal can be claimed.
    pub unlock_height: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WithdrawalRequest {
    pub amount: Amount,
}

/// Move tokens from the caller into a ledger wallet.
#[utoipa::path(
    post,
    path = "/v1/wallets/deposit",
    tag = "Wallets",
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Wallet credited", body = MutationResponse),
        (status = 400, description = "Zero amount or memo too long", body = crate::error::ErrorBody),
        (status = 401, description = "Missing caller identity"),
        (status = 502, description = "Token transfer failed", body = crate::error::ErrorBody)
    )
)]
pub async fn deposit(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<DepositRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let memo = parse_memo(request.memo)?;
    let recipient = request
        .recipient
        .unwrap_or_else(|| caller.principal.clone());
    execute(&state, "deposit", caller, |ledger, ctx| {
        ledger.deposit(ctx, request.amount, recipient, memo)
    })
    .await
}

/// Ledger record of one principal.
#[utoipa::path(
    get,
    path = "/v1/wallets/{principal}",
    tag = "Wallets",
    params(("principal" = String, Path, description = "Wallet owner")),
    responses(
        (status = 200, description = "Wallet data", body = WalletDataResponse),
        (status = 400, description = "Malformed principal", body = crate::error::ErrorBody)
    )
)]
pub async fn get_wallet_data(
    State(state): State<AppState>,
    Path(principal): Path<String>,
) -> Result<Json<WalletDataResponse>, ApiError> {
    let principal = parse_principal(&principal)?;
    let service = state.ledger.read().await;
    let ledger = service.ledger();
    let wallet = ledger.wallet(&principal);

    Ok(Json(WalletDataResponse {
        principal,
        withdrawal: wallet.withdrawal_state(),
        unlock_height: wallet.unlock_height(ledger.blocks_to_withdraw()),
        wallet,
    }))
}

/// Lock part of the caller's balance for withdrawal.
///
/// A second request adds to the pending amount and restarts the timelock.
#[utoipa::path(
    post,
    path = "/v1/wallets/withdrawals",
    tag = "Wallets",
    request_body = WithdrawalRequest,
    responses(
        (status = 200, description = "Withdrawal requested", body = MutationResponse),
        (status = 400, description = "Zero amount", body = crate::error::ErrorBody),
        (status = 409, description = "Balance too low", body = crate::error::ErrorBody)
    )
)]
pub async fn request_withdrawal(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<WithdrawalRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    execute(&state, "request-withdrawal", caller, |ledger, ctx| {
        ledger.request_withdrawal(ctx, request.amount)
    })
    .await
}

#[utoipa::path(
    post,
    path = "/v1/wallets/withdrawals/claim",
    tag = "Wallets",
    responses(
        (status = 200, description = "Pending withdrawal paid out", body = MutationResponse),
        (status = 400, description = "Timelock has not elapsed", body = crate::error::ErrorBody),
        (status = 409, description = "No pending withdrawal", body = crate::error::ErrorBody)
    )
)]
pub async fn claim_withdrawal(
    caller: Caller,
    State(state): State<AppState>,
) -> Result<Json<MutationResponse>, ApiError> {
    execute(&state, "claim-withdrawal", caller, |ledger, ctx| {
        ledger.claim_withdrawal(ctx)
    })
    .await
}
