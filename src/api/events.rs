// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{error::ApiError, ledger::LedgerEvent, state::AppState};

const DEFAULT_EVENT_LIMIT: usize = 50;

/// Query parameters for the event journal.
#[derive(Debug, Deserialize, IntoParams)]
pub struct EventListQuery {
    /// Number of events to skip (default: 0)
    pub offset: Option<u64>,
    /// Maximum number of results (default: 50, capped at 500)
    #[param(default = 50)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventPage {
    pub events: Vec<LedgerEvent>,
    pub offset: u64,
    /// Total number of committed events.
    pub total: u64,
}

/// Page of the journal, oldest first.
#[utoipa::path(
    get,
    path = "/v1/events",
    tag = "Events",
    params(EventListQuery),
    responses(
        (status = 200, description = "Event page", body = EventPage),
        (status = 500, description = "Storage read failed", body = crate::error::ErrorBody)
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<EventPage>, ApiError> {
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT);

    let service = state.ledger.read().await;
    let (events, total) = service.events(offset, limit)?;
    Ok(Json(EventPage {
        events,
        offset,
        total,
    }))
}
