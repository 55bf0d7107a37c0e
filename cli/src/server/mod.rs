// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Gateway process: HTTP server lifecycle and the client used to reach it

pub mod client;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use polytenant_core::application::ConnectionCache;
use polytenant_core::domain::gateway_config::GatewayConfigManifest;
use polytenant_core::infrastructure::PostgresProvider;
use polytenant_core::presentation::{app, AppState};

pub use client::GatewayClient;

pub async fn start_server(config_path: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = GatewayConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
    if let Some(host) = host {
        config.spec.server.bind_address = host;
    }
    if let Some(port) = port {
        config.spec.server.port = port;
    }

    config.validate().context("Configuration validation failed")?;

    info!(
        name = %config.metadata.name,
        engines = config.spec.engines.len(),
        tenants = config.spec.tenants.len(),
        "Configuration loaded"
    );

    if config.spec.observability.metrics_enabled {
        install_metrics_exporter(config.spec.observability.metrics_port)?;
    }

    let provider = PostgresProvider::from_config(&config.spec.engines, config.spec.pool.acquire_timeout)
        .await
        .context("Failed to open base database connections")?;

    let cache = ConnectionCache::start(Arc::new(provider), config.spec.cache.clone(), config.spec.pool.clone());
    let state = Arc::new(AppState::new(cache.clone(), config.tenant_directory()));

    let addr = format!("{}:{}", config.spec.server.bind_address, config.spec.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Gateway listening on {}", addr);

    let served = axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed");

    info!("Gateway shutting down");

    let report = cache.shutdown().await;
    if report.failures.is_empty() {
        info!(closed = report.closed, "Connection cache drained");
    } else {
        warn!(
            closed = report.closed,
            failures = report.failures.len(),
            "Connection cache drained with close failures"
        );
    }

    served
}

fn install_metrics_exporter(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;

    info!("Prometheus metrics exposed on {}", addr);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
