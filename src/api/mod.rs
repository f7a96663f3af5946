// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::HeaderName,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::Caller,
    error::{ApiError, ErrorBody},
    ledger::{
        CallContext, CustodyReport, FeeSplit, GovernanceConfig, LedgerError, LedgerEvent,
        LedgerEventKind, LedgerResult, ProtocolRole, Receipt, TransferVariant, Treasuries,
        TreasuryKind, Wallet, WithdrawalState,
    },
    models::{Memo, Principal},
    service::SimulatedLedger,
    state::AppState,
};

pub mod chain;
pub mod events;
pub mod governance;
pub mod health;
pub mod token;
pub mod transfers;
pub mod treasury;
pub mod wallets;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/governance", get(governance::get_governance))
        .route(
            "/governance/contract-manager",
            get(governance::get_contract_manager).put(governance::set_contract_manager),
        )
        .route(
            "/governance/sponsor-operator",
            get(governance::get_sponsor_operator).put(governance::set_sponsor_operator),
        )
        .route(
            "/governance/fee-collector-operator",
            get(governance::get_fee_collector_operator)
                .put(governance::set_fee_collector_operator),
        )
        .route(
            "/governance/governance-withdrawer",
            get(governance::get_governance_withdrawer).put(governance::set_governance_withdrawer),
        )
        .route(
            "/governance/fee-ratio",
            get(governance::get_fee_ratio).put(governance::set_fee_ratio),
        )
        .route(
            "/governance/blocks-to-withdraw",
            get(governance::get_blocks_to_withdraw).put(governance::set_blocks_to_withdraw),
        )
        .route("/treasury", get(treasury::get_treasuries))
        .route("/treasury/custody", get(treasury::custody_report))
        .route("/treasury/fees", post(treasury::pay_fee))
        .route(
            "/treasury/governance/withdraw",
            post(treasury::withdraw_governance_treasury),
        )
        .route(
            "/treasury/operator/withdraw",
            post(treasury::withdraw_operator_treasury),
        )
        .route(
            "/treasury/governance/deposit",
            post(treasury::deposit_governance_treasury),
        )
        .route("/wallets/deposit", post(wallets::deposit))
        .route("/wallets/withdrawals", post(wallets::request_withdrawal))
        .route("/wallets/withdrawals/claim", post(wallets::claim_withdrawal))
        .route("/wallets/{principal}", get(wallets::get_wallet_data))
        .route(
            "/transfers/stacks-to-stacks",
            post(transfers::transfer_stacks_to_stacks),
        )
        .route(
            "/transfers/stacks-to-bolt",
            post(transfers::transfer_stacks_to_bolt),
        )
        .route("/transfers/bolt-to-bolt", post(transfers::transfer_bolt_to_bolt))
        .route(
            "/transfers/bolt-to-stacks",
            post(transfers::transfer_bolt_to_stacks),
        )
        .route("/token/mint", post(token::mint))
        .route("/token/balances/{principal}", get(token::get_balance))
        .route("/chain", get(chain::get_chain))
        .route("/chain/advance", post(chain::advance_chain))
        .route("/events", get(events::list_events))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

/// Body of every successful mutation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MutationResponse {
    pub ok: bool,
    /// Journal entry recorded for the operation.
    pub event: LedgerEvent,
}

/// Run `op` under the global write lock on behalf of `caller`.
pub(crate) async fn execute<F>(
    state: &AppState,
    operation: &'static str,
    caller: Caller,
    op: F,
) -> Result<Json<MutationResponse>, ApiError>
where
    F: FnOnce(&mut SimulatedLedger, &CallContext) -> LedgerResult<Receipt> + Send,
{
    let mut service = state.ledger.write().await;
    let event = service.execute(operation, caller.principal, caller.sponsor, op)?;
    Ok(Json(MutationResponse { ok: true, event }))
}

/// Validate an optional memo from a request body.
pub(crate) fn parse_memo(memo: Option<String>) -> Result<Option<Memo>, ApiError> {
    memo.map(Memo::new)
        .transpose()
        .map_err(|e| ApiError::from(LedgerError::from(e)))
}

/// Principal taken from a path segment.
pub(crate) fn parse_principal(raw: &str) -> Result<Principal, ApiError> {
    Principal::parse(raw).map_err(|e| ApiError::bad_request(e.to_string()))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        governance::get_governance,
        governance::get_contract_manager,
        governance::set_contract_manager,
        governance::get_sponsor_operator,
        governance::set_sponsor_operator,
        governance::get_fee_collector_operator,
        governance::set_fee_collector_operator,
        governance::get_governance_withdrawer,
        governance::set_governance_withdrawer,
        governance::get_fee_ratio,
        governance::set_fee_ratio,
        governance::get_blocks_to_withdraw,
        governance::set_blocks_to_withdraw,
        treasury::get_treasuries,
        treasury::custody_report,
        treasury::pay_fee,
        treasury::withdraw_governance_treasury,
        treasury::withdraw_operator_treasury,
        treasury::deposit_governance_treasury,
        wallets::deposit,
        wallets::get_wallet_data,
        wallets::request_withdrawal,
        wallets::claim_withdrawal,
        transfers::transfer_stacks_to_stacks,
        transfers::transfer_stacks_to_bolt,
        transfers::transfer_bolt_to_bolt,
        transfers::transfer_bolt_to_stacks,
        token::mint,
        token::get_balance,
        chain::get_chain,
        chain::advance_chain,
        events::list_events
    ),
    components(
        schemas(
            ErrorBody,
            MutationResponse,
            LedgerEvent,
            LedgerEventKind,
            TransferVariant,
            FeeSplit,
            GovernanceConfig,
            ProtocolRole,
            Treasuries,
            TreasuryKind,
            CustodyReport,
            Wallet,
            WithdrawalState,
            Principal,
            Memo,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            governance::RoleResponse,
            governance::SetRoleRequest,
            governance::FeeRatioResponse,
            governance::SetFeeRatioRequest,
            governance::BlocksToWithdrawResponse,
            governance::SetBlocksToWithdrawRequest,
            treasury::TreasuryResponse,
            treasury::AmountRequest,
            treasury::TreasuryWithdrawRequest,
            wallets::DepositRequest,
            wallets::WalletDataResponse,
            wallets::WithdrawalRequest,
            transfers::TransferRequest,
            token::MintRequest,
            token::TokenBalanceResponse,
            chain::ChainResponse,
            chain::AdvanceChainRequest,
            events::EventPage
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Governance", description = "Role holders, fee ratio and withdrawal timelock"),
        (name = "Treasury", description = "Fee treasuries and custody reconciliation"),
        (name = "Wallets", description = "Ledger balances, deposits and timelocked withdrawals"),
        (name = "Transfers", description = "Fee-bearing transfers between external and ledger balances"),
        (name = "Token", description = "Simulated token ledger"),
        (name = "Chain", description = "Block height"),
        (name = "Events", description = "Journal of committed operations")
    )
)]
pub struct ApiDoc;
