// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Block height source for withdrawal timelocks.
//!
//! Two modes:
//!
//! - `Manual` - height only moves when the contract manager advances it
//! - `Interval` - height is `1 + whole intervals since genesis`
//!
//! Heights start at 1 and never move backwards, including across restarts
//! that switch between modes (see [`BlockClock::resume`]).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Clock mode selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    Manual,
    Interval { interval_secs: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    #[error("block interval must be at least one second")]
    ZeroInterval,

    #[error("chain height is derived from wall-clock time and cannot be advanced")]
    NotManual,

    #[error("advance must be at least one block")]
    ZeroAdvance,

    #[error("chain height overflow")]
    Overflow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum BlockClock {
    Manual {
        height: u64,
    },
    Interval {
        genesis: DateTime<Utc>,
        interval_secs: u64,
    },
}

impl BlockClock {
    pub fn manual(height: u64) -> Self {
        BlockClock::Manual {
            height: height.max(1),
        }
    }

    pub fn interval(genesis: DateTime<Utc>, interval_secs: u64) -> Result<Self, ClockError> {
        if interval_secs == 0 {
            return Err(ClockError::ZeroInterval);
        }
        Ok(BlockClock::Interval {
            genesis,
            interval_secs,
        })
    }

    /// Clock for `mode`, continuing from a previously persisted clock.
    pub fn resume(
        persisted: Option<BlockClock>,
        mode: ClockMode,
        now: DateTime<Utc>,
    ) -> Result<Self, ClockError> {
        let Some(persisted) = persisted else {
            return match mode {
                ClockMode::Manual => Ok(BlockClock::manual(1)),
                ClockMode::Interval { interval_secs } => BlockClock::interval(now, interval_secs),
            };
        };

        match (mode, persisted) {
            (ClockMode::Manual, previous) => Ok(BlockClock::manual(previous.height_at(now))),
            (
                ClockMode::Interval { interval_secs },
                BlockClock::Interval {
                    genesis,
                    interval_secs: previous_secs,
                },
            ) if interval_secs == previous_secs => BlockClock::interval(genesis, interval_secs),
            (ClockMode::Interval { interval_secs }, previous) => {
                // backdate genesis so the new clock continues from the old height
                let height = previous.height_at(now);
                let elapsed = height.saturating_sub(1).saturating_mul(interval_secs);
                let genesis = i64::try_from(elapsed)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .and_then(|d| now.checked_sub_signed(d))
                    .unwrap_or(now);
                BlockClock::interval(genesis, interval_secs)
            }
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, BlockClock::Manual { .. })
    }

    /// Current height.
    pub fn height(&self) -> u64 {
        self.height_at(Utc::now())
    }

    pub fn height_at(&self, now: DateTime<Utc>) -> u64 {
        match self {
            BlockClock::Manual { height } => *height,
            BlockClock::Interval {
                genesis,
                interval_secs,
            } => {
                let elapsed = (now - *genesis).num_seconds().max(0) as u64;
                1u64.saturating_add(elapsed / (*interval_secs).max(1))
            }
        }
    }

    /// Advance a manual clock by `blocks`. Returns `(from, to)`.
    pub fn advance(&mut self, blocks: u64) -> Result<(u64, u64), ClockError> {
        let BlockClock::Manual { height } = self else {
            return Err(ClockError::NotManual);
        };
        if blocks == 0 {
            return Err(ClockError::ZeroAdvance);
        }
        let from = *height;
        let to = from.checked_add(blocks).ok_or(ClockError::Overflow)?;
        *height = to;
        Ok((from, to))
    }
}
