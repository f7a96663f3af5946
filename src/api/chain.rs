// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::MutationResponse;
use crate::{auth::Caller, error::ApiError, state::AppState};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChainResponse {
    pub block_height: u64,
    /// `manual` or `interval`.
    pub mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdvanceChainRequest {
    pub blocks: u64,
}

#[utoipa::path(
    get,
    path = "/v1/chain",
    tag = "Chain",
    responses((status = 200, description = "Current block height", body = ChainResponse))
)]
pub async fn get_chain(State(state): State<AppState>) -> Json<ChainResponse> {
    let service = state.ledger.read().await;
    let clock = service.clock();
    Json(ChainResponse {
        block_height: clock.height(),
        mode: if clock.is_manual() { "manual" } else { "interval" }.to_string(),
    })
}

/// Advance the manual clock. Contract manager only.
#[utoipa::path(
    post,
    path = "/v1/chain/advance",
    tag = "Chain",
    request_body = AdvanceChainRequest,
    responses(
        (status = 200, description = "Clock advanced", body = MutationResponse),
        (status = 400, description = "Zero blocks or clock is not manual", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not the contract manager", body = crate::error::ErrorBody)
    )
)]
pub async fn advance_chain(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<AdvanceChainRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let mut service = state.ledger.write().await;
    let event = service.advance_chain(caller.principal, request.blocks)?;
    Ok(Json(MutationResponse { ok: true, event }))
}
