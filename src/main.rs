// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use bolt_ledger::{
    api::router,
    config::{LogFormat, ServerConfig, DEFAULT_LOG_FILTER},
    service::{LedgerService, ServiceError},
    state::AppState,
    storage::LedgerDb,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            // logging is configured from the same environment
            eprintln!("Invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.log_format);

    let service = match open_service(&config) {
        Ok(service) => service,
        Err(err) => {
            tracing::error!(error = %err, "Failed to initialize ledger service");
            return ExitCode::FAILURE;
        }
    };

    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(addr = %config.bind_addr, error = %err, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    tracing::info!(
        addr = %config.bind_addr,
        custody = %config.ledger.custody,
        persistent = config.data_dir.is_some(),
        "Bolt ledger listening (docs at /docs)"
    );

    let app = router(AppState::new(service));
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await;

    match result {
        Ok(()) => {
            tracing::info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Server failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn open_service(config: &ServerConfig) -> Result<LedgerService, ServiceError> {
    match config.ledger_db_path() {
        Some(path) => {
            tracing::info!(path = %path.display(), "Opening ledger database");
            let db = LedgerDb::open(&path)?;
            LedgerService::open(&config.ledger, db)
        }
        None => {
            tracing::warn!("DATA_DIR not set, ledger state will not survive a restart");
            LedgerService::in_memory(&config.ledger)
        }
    }
}

async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
    shutdown.cancel();
}
