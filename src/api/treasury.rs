// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{execute, MutationResponse};
use crate::{
    auth::Caller,
    error::ApiError,
    ledger::{CustodyReport, TreasuryKind},
    models::{Amount, Principal},
    state::AppState,
};

/// Balances of both fee treasuries.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TreasuryResponse {
    pub governance: Amount,
    pub operator: Amount,
    pub total: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AmountRequest {
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TreasuryWithdrawRequest {
    pub amount: Amount,
    pub recipient: Principal,
}

#[utoipa::path(
    get,
    path = "/v1/treasury",
    tag = "Treasury",
    responses((status = 200, description = "Treasury balances", body = TreasuryResponse))
)]
pub async fn get_treasuries(State(state): State<AppState>) -> Json<TreasuryResponse> {
    let service = state.ledger.read().await;
    let treasuries = service.ledger().treasuries();
    Json(TreasuryResponse {
        governance: treasuries.balance(TreasuryKind::Governance),
        operator: treasuries.balance(TreasuryKind::Operator),
        total: treasuries.total(),
    })
}

/// Custody holdings reconciled against wallet and treasury liabilities.
#[utoipa::path(
    get,
    path = "/v1/treasury/custody",
    tag = "Treasury",
    responses((status = 200, description = "Custody report", body = CustodyReport))
)]
pub async fn custody_report(State(state): State<AppState>) -> Json<CustodyReport> {
    let service = state.ledger.read().await;
    Json(service.ledger().custody_report())
}

/// Pay a fee from the caller's token balance into the treasuries.
#[utoipa::path(
    post,
    path = "/v1/treasury/fees",
    tag = "Treasury",
    request_body = AmountRequest,
    responses(
        (status = 200, description = "Fee paid and split", body = MutationResponse),
        (status = 400, description = "Zero amount", body = crate::error::ErrorBody),
        (status = 401, description = "Missing caller identity"),
        (status = 502, description = "Token transfer failed", body = crate::error::ErrorBody)
    )
)]
pub async fn pay_fee(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    execute(&state, "pay-fee", caller, |ledger, ctx| {
        ledger.pay_fee(ctx, request.amount)
    })
    .await
}

#[utoipa::path(
    post,
    path = "/v1/treasury/governance/withdraw",
    tag = "Treasury",
    request_body = TreasuryWithdrawRequest,
    responses(
        (status = 200, description = "Governance treasury paid out", body = MutationResponse),
        (status = 403, description = "Caller is not the governance withdrawer", body = crate::error::ErrorBody),
        (status = 409, description = "Treasury balance too low", body = crate::error::ErrorBody)
    )
)]
pub async fn withdraw_governance_treasury(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<TreasuryWithdrawRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    execute(&state, "withdraw-governance-treasury", caller, |ledger, ctx| {
        ledger.withdraw_governance_treasury(ctx, request.amount, request.recipient)
    })
    .await
}

#[utoipa::path(
    post,
    path = "/v1/treasury/operator/withdraw",
    tag = "Treasury",
    request_body = TreasuryWithdrawRequest,
    responses(
        (status = 200, description = "Operator treasury paid out", body = MutationResponse),
        (status = 403, description = "Caller is not the fee collector operator", body = crate::error::ErrorBody),
        (status = 409, description = "Treasury balance too low", body = crate::error::ErrorBody)
    )
)]
pub async fn withdraw_operator_treasury(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<TreasuryWithdrawRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    execute(&state, "withdraw-operator-treasury", caller, |ledger, ctx| {
        ledger.withdraw_operator_treasury(ctx, request.amount, request.recipient)
    })
    .await
}

/// Top up the governance treasury from the caller's token balance.
#[utoipa::path(
    post,
    path = "/v1/treasury/governance/deposit",
    tag = "Treasury",
    request_body = AmountRequest,
    responses(
        (status = 200, description = "Governance treasury credited", body = MutationResponse),
        (status = 400, description = "Zero amount", body = crate::error::ErrorBody),
        (status = 502, description = "Token transfer failed", body = crate::error::ErrorBody)
    )
)]
pub async fn deposit_governance_treasury(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    execute(&state, "deposit-governance-treasury", caller, |ledger, ctx| {
        ledger.deposit_governance_treasury(ctx, request.amount)
    })
    .await
}
