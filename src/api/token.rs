// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{execute, parse_principal, MutationResponse};
use crate::{
    auth::Caller,
    error::ApiError,
    models::{Amount, Principal},
    state::AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MintRequest {
    pub amount: Amount,
    pub recipient: Principal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenBalanceResponse {
    pub principal: Principal,
    pub balance: Amount,
}

/// Mint simulated tokens. Contract manager only.
#[utoipa::path(
    post,
    path = "/v1/token/mint",
    tag = "Token",
    request_body = MintRequest,
    responses(
        (status = 200, description = "Tokens minted", body = MutationResponse),
        (status = 403, description = "Caller is not the contract manager", body = crate::error::ErrorBody),
        (status = 502, description = "Mint rejected by the token", body = crate::error::ErrorBody)
    )
)]
pub async fn mint(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<MintRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    execute(&state, "mint", caller, |ledger, ctx| {
        ledger.mint_tokens(ctx, request.amount, request.recipient)
    })
    .await
}

/// External token balance of a principal.
#[utoipa::path(
    get,
    path = "/v1/token/balances/{principal}",
    tag = "Token",
    params(("principal" = String, Path, description = "Token holder")),
    responses(
        (status = 200, description = "Token balance", body = TokenBalanceResponse),
        (status = 400, description = "Malformed principal", body = crate::error::ErrorBody)
    )
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Path(principal): Path<String>,
) -> Result<Json<TokenBalanceResponse>, ApiError> {
    let principal = parse_principal(&principal)?;
    let service = state.ledger.read().await;
    let balance = service.ledger().token_balance(&principal);
    Ok(Json(TokenBalanceResponse { principal, balance }))
}
