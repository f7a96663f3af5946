// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::service::LedgerService;

/// Shared handler state.
///
/// The lock is the global execution lock: mutations take the write half,
/// so ledger operations never interleave.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<RwLock<LedgerService>>,
}

impl AppState {
    pub fn new(service: LedgerService) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(service)),
        }
    }
}
