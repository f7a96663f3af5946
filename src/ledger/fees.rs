// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fee split between the governance and operator treasuries.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Amount;

/// Shares of one fee. `governance + operator` always equals the fee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FeeSplit {
    pub governance: Amount,
    pub operator: Amount,
}

impl FeeSplit {
    pub fn total(&self) -> Amount {
        self.governance + self.operator
    }
}

/// Split `fee` using `governance_fee_ratio` percent.
///
/// The governance share is `floor(fee * ratio / 100)`; the operator takes
/// the remainder so no unit is lost to rounding.
pub fn split_fee(fee: Amount, governance_fee_ratio: u8) -> FeeSplit {
    let ratio = Amount::from(governance_fee_ratio.min(100));
    // floor(fee * ratio / 100) without overflowing on large fees
    let governance = (fee / 100) * ratio + (fee % 100) * ratio / 100;
    FeeSplit {
        governance,
        operator: fee - governance,
    }
}
