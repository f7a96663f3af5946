// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Governance endpoints: role holders, fee ratio and withdrawal timelock.
//!
//! Reads are public. Every setter is restricted to the contract manager,
//! which the ledger enforces.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{execute, MutationResponse};
use crate::{
    auth::Caller,
    error::ApiError,
    ledger::{GovernanceConfig, ProtocolRole},
    models::Principal,
    state::AppState,
};

/// Holder of one protocol role.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleResponse {
    pub role: ProtocolRole,
    pub principal: Principal,
}

/// Request to reassign a role.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetRoleRequest {
    pub principal: Principal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeeRatioResponse {
    /// Governance share of every fee, in percent.
    pub governance_fee_ratio: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetFeeRatioRequest {
    /// New governance share in percent (0-100).
    pub governance_fee_ratio: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlocksToWithdrawResponse {
    pub blocks_to_withdraw: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetBlocksToWithdrawRequest {
    pub blocks_to_withdraw: u64,
}

async fn role(state: &AppState, role: ProtocolRole) -> Json<RoleResponse> {
    let service = state.ledger.read().await;
    Json(RoleResponse {
        role,
        principal: service.ledger().role_holder(role).clone(),
    })
}

async fn assign(
    state: &AppState,
    caller: Caller,
    role: ProtocolRole,
    principal: Principal,
) -> Result<Json<MutationResponse>, ApiError> {
    let operation = match role {
        ProtocolRole::ContractManager => "set-contract-manager",
        ProtocolRole::SponsorOperator => "set-sponsor-operator",
        ProtocolRole::FeeCollectorOperator => "set-fee-collector-operator",
        ProtocolRole::GovernanceWithdrawer => "set-governance-withdrawer",
    };
    execute(state, operation, caller, |ledger, ctx| {
        ledger.set_role(ctx, role, principal)
    })
    .await
}

/// Full governance configuration.
#[utoipa::path(
    get,
    path = "/v1/governance",
    tag = "Governance",
    responses(
        (status = 200, description = "Governance configuration", body = GovernanceConfig)
    )
)]
pub async fn get_governance(State(state): State<AppState>) -> Json<GovernanceConfig> {
    let service = state.ledger.read().await;
    Json(service.ledger().config().clone())
}

#[utoipa::path(
    get,
    path = "/v1/governance/contract-manager",
    tag = "Governance",
    responses((status = 200, description = "Current contract manager", body = RoleResponse))
)]
pub async fn get_contract_manager(State(state): State<AppState>) -> Json<RoleResponse> {
    role(&state, ProtocolRole::ContractManager).await
}

/// Hand the contract manager role to another principal.
#[utoipa::path(
    put,
    path = "/v1/governance/contract-manager",
    tag = "Governance",
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "Role reassigned", body = MutationResponse),
        (status = 401, description = "Missing caller identity"),
        (status = 403, description = "Caller is not the contract manager")
    )
)]
pub async fn set_contract_manager(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<SetRoleRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    assign(&state, caller, ProtocolRole::ContractManager, request.principal).await
}

#[utoipa::path(
    get,
    path = "/v1/governance/sponsor-operator",
    tag = "Governance",
    responses((status = 200, description = "Current sponsor operator", body = RoleResponse))
)]
pub async fn get_sponsor_operator(State(state): State<AppState>) -> Json<RoleResponse> {
    role(&state, ProtocolRole::SponsorOperator).await
}

#[utoipa::path(
    put,
    path = "/v1/governance/sponsor-operator",
    tag = "Governance",
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "Role reassigned", body = MutationResponse),
        (status = 403, description = "Caller is not the contract manager")
    )
)]
pub async fn set_sponsor_operator(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<SetRoleRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    assign(&state, caller, ProtocolRole::SponsorOperator, request.principal).await
}

#[utoipa::path(
    get,
    path = "/v1/governance/fee-collector-operator",
    tag = "Governance",
    responses((status = 200, description = "Current fee collector operator", body = RoleResponse))
)]
pub async fn get_fee_collector_operator(State(state): State<AppState>) -> Json<RoleResponse> {
    role(&state, ProtocolRole::FeeCollectorOperator).await
}

#[utoipa::path(
    put,
    path = "/v1/governance/fee-collector-operator",
    tag = "Governance",
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "Role reassigned", body = MutationResponse),
        (status = 403, description = "Caller is not the contract manager")
    )
)]
pub async fn set_fee_collector_operator(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<SetRoleRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    assign(&state, caller, ProtocolRole::FeeCollectorOperator, request.principal).await
}

#[utoipa::path(
    get,
    path = "/v1/governance/governance-withdrawer",
    tag = "Governance",
    responses((status = 200, description = "Current governance withdrawer", body = RoleResponse))
)]
pub async fn get_governance_withdrawer(State(state): State<AppState>) -> Json<RoleResponse> {
    role(&state, ProtocolRole::GovernanceWithdrawer).await
}

#[utoipa::path(
    put,
    path = "/v1/governance/governance-withdrawer",
    tag = "Governance",
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "Role reassigned", body = MutationResponse),
        (status = 403, description = "Caller is not the contract manager")
    )
)]
pub async fn set_governance_withdrawer(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<SetRoleRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    assign(&state, caller, ProtocolRole::GovernanceWithdrawer, request.principal).await
}

#[utoipa::path(
    get,
    path = "/v1/governance/fee-ratio",
    tag = "Governance",
    responses((status = 200, description = "Governance fee ratio", body = FeeRatioResponse))
)]
pub async fn get_fee_ratio(State(state): State<AppState>) -> Json<FeeRatioResponse> {
    let service = state.ledger.read().await;
    Json(FeeRatioResponse {
        governance_fee_ratio: service.ledger().governance_fee_ratio(),
    })
}

/// Change the governance share of future fees.
#[utoipa::path(
    put,
    path = "/v1/governance/fee-ratio",
    tag = "Governance",
    request_body = SetFeeRatioRequest,
    responses(
        (status = 200, description = "Ratio updated", body = MutationResponse),
        (status = 400, description = "Ratio above 100"),
        (status = 403, description = "Caller is not the contract manager")
    )
)]
pub async fn set_fee_ratio(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<SetFeeRatioRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    // out-of-range values still reach the ledger so the role check runs first
    let ratio = u8::try_from(request.governance_fee_ratio).unwrap_or(u8::MAX);
    execute(&state, "set-governance-fee-ratio", caller, |ledger, ctx| {
        ledger.set_governance_fee_ratio(ctx, ratio)
    })
    .await
}

#[utoipa::path(
    get,
    path = "/v1/governance/blocks-to-withdraw",
    tag = "Governance",
    responses((status = 200, description = "Withdrawal timelock in blocks", body = BlocksToWithdrawResponse))
)]
pub async fn get_blocks_to_withdraw(State(state): State<AppState>) -> Json<BlocksToWithdrawResponse> {
    let service = state.ledger.read().await;
    Json(BlocksToWithdrawResponse {
        blocks_to_withdraw: service.ledger().blocks_to_withdraw(),
    })
}

#[utoipa::path(
    put,
    path = "/v1/governance/blocks-to-withdraw",
    tag = "Governance",
    request_body = SetBlocksToWithdrawRequest,
    responses(
        (status = 200, description = "Timelock updated", body = MutationResponse),
        (status = 403, description = "Caller is not the contract manager")
    )
)]
pub async fn set_blocks_to_withdraw(
    caller: Caller,
    State(state): State<AppState>,
    Json(request): Json<SetBlocksToWithdrawRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    execute(&state, "set-blocks-to-withdraw", caller, |ledger, ctx| {
        ledger.set_blocks_to_withdraw(ctx, request.blocks_to_withdraw)
    })
    .await
}
