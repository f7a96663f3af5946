// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding `ledger.redb` | unset (in-memory) |
//! | `CONTRACT_PRINCIPAL` | Custody contract principal of the ledger | `SP3QZNX3...boltproto-sbtc` |
//! | `CONTRACT_MANAGER` | Initial holder of every role | simnet deployer |
//! | `GOVERNANCE_FEE_RATIO` | Initial governance share, percent | `30` |
//! | `BLOCKS_TO_WITHDRAW` | Initial withdrawal timelock | `144` |
//! | `BLOCK_INTERVAL_SECS` | Enables the wall-clock block height | unset (manual) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::chain::ClockMode;
use crate::ledger::MAX_GOVERNANCE_FEE_RATIO;
use crate::models::Principal;
use crate::service::LedgerSettings;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the ledger data directory.
///
/// When unset the service keeps all state in memory and loses it on exit.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const CONTRACT_PRINCIPAL_ENV: &str = "CONTRACT_PRINCIPAL";
pub const CONTRACT_MANAGER_ENV: &str = "CONTRACT_MANAGER";
pub const GOVERNANCE_FEE_RATIO_ENV: &str = "GOVERNANCE_FEE_RATIO";
pub const BLOCKS_TO_WITHDRAW_ENV: &str = "BLOCKS_TO_WITHDRAW";
pub const BLOCK_INTERVAL_SECS_ENV: &str = "BLOCK_INTERVAL_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CONTRACT_PRINCIPAL: &str =
    "SP3QZNX3CGT6V7PE1PBK17FCRK1TP1AT02ZHQCMVJ.boltproto-sbtc";
pub const DEFAULT_CONTRACT_MANAGER: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";
pub const DEFAULT_GOVERNANCE_FEE_RATIO: u8 = 30;
/// Roughly one day of Bitcoin blocks.
pub const DEFAULT_BLOCKS_TO_WITHDRAW: u64 = 144;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// File name of the redb database inside `DATA_DIR`.
pub const LEDGER_DB_FILE: &str = "ledger.redb";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not valid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            name,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: Option<PathBuf>,
    pub ledger: LedgerSettings,
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any key/value source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host: IpAddr = get(HOST_ENV)
            .as_deref()
            .unwrap_or(DEFAULT_HOST)
            .parse()
            .map_err(|e| ConfigError::invalid(HOST_ENV, e))?;
        let port = parse_or(get(PORT_ENV), PORT_ENV, DEFAULT_PORT)?;

        let custody = parse_principal(
            get(CONTRACT_PRINCIPAL_ENV),
            CONTRACT_PRINCIPAL_ENV,
            DEFAULT_CONTRACT_PRINCIPAL,
        )?;
        if !custody.is_contract() {
            return Err(ConfigError::invalid(
                CONTRACT_PRINCIPAL_ENV,
                "must be a contract principal (address.name)",
            ));
        }
        let contract_manager = parse_principal(
            get(CONTRACT_MANAGER_ENV),
            CONTRACT_MANAGER_ENV,
            DEFAULT_CONTRACT_MANAGER,
        )?;

        let governance_fee_ratio = parse_or(
            get(GOVERNANCE_FEE_RATIO_ENV),
            GOVERNANCE_FEE_RATIO_ENV,
            DEFAULT_GOVERNANCE_FEE_RATIO,
        )?;
        if governance_fee_ratio > MAX_GOVERNANCE_FEE_RATIO {
            return Err(ConfigError::invalid(
                GOVERNANCE_FEE_RATIO_ENV,
                "must be between 0 and 100",
            ));
        }
        let blocks_to_withdraw = parse_or(
            get(BLOCKS_TO_WITHDRAW_ENV),
            BLOCKS_TO_WITHDRAW_ENV,
            DEFAULT_BLOCKS_TO_WITHDRAW,
        )?;

        let clock_mode = match get(BLOCK_INTERVAL_SECS_ENV) {
            None => ClockMode::Manual,
            Some(raw) => {
                let interval_secs: u64 = raw
                    .parse()
                    .map_err(|e| ConfigError::invalid(BLOCK_INTERVAL_SECS_ENV, e))?;
                if interval_secs == 0 {
                    return Err(ConfigError::invalid(
                        BLOCK_INTERVAL_SECS_ENV,
                        "must be at least 1",
                    ));
                }
                ClockMode::Interval { interval_secs }
            }
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::invalid(
                    LOG_FORMAT_ENV,
                    format!("expected json or pretty, got {other}"),
                ))
            }
        };

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            data_dir: get(DATA_DIR_ENV).map(PathBuf::from),
            ledger: LedgerSettings {
                custody,
                contract_manager,
                governance_fee_ratio,
                blocks_to_withdraw,
                clock_mode,
            },
            log_format,
        })
    }

    /// Path of the redb file, if persistence is enabled.
    pub fn ledger_db_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(LEDGER_DB_FILE))
    }
}

fn parse_or<T>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.parse().map_err(|e| ConfigError::invalid(name, e)),
        None => Ok(default),
    }
}

fn parse_principal(
    raw: Option<String>,
    name: &'static str,
    default: &str,
) -> Result<Principal, ConfigError> {
    Principal::parse(raw.as_deref().unwrap_or(default)).map_err(|e| ConfigError::invalid(name, e))
}
