// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP portal server

use anyhow::{Context, Result};
use clap::Args;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use tramites_core::application::Portal;
use tramites_core::domain::config::PortalConfigManifest;
use tramites_core::presentation::api;

#[derive(Args)]
pub struct ServeArgs {
    /// Bind address (overrides spec.network.bind_address)
    #[arg(long, env = "TRAMITES_HOST")]
    host: Option<String>,

    /// HTTP port (overrides spec.network.port)
    #[arg(long, env = "TRAMITES_PORT")]
    port: Option<u16>,
}

pub async fn execute(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = PortalConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    info!(
        name = %config.metadata.name,
        institution = %config.spec.institution.short_name,
        "Configuration loaded"
    );

    let metrics = &config.spec.observability.metrics;
    if metrics.enabled {
        let addr = SocketAddr::from(([0, 0, 0, 0], metrics.port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to start Prometheus exporter")?;
        describe_metrics();
        info!("Metrics exporter listening on {}", addr);
    }

    if config.spec.identity.client_id.is_empty() {
        warn!("spec.identity.client_id is not set; browsers cannot obtain tokens for this portal");
    }

    let host = args.host.unwrap_or_else(|| config.spec.network.bind_address.clone());
    let port = args.port.unwrap_or(config.spec.network.port);

    let portal = Portal::from_config(config).context("Failed to initialize portal")?;
    let app = api::app(Arc::new(portal));

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Portal listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Portal shutting down");

    Ok(())
}

fn describe_metrics() {
    metrics::describe_counter!(
        "tramites_submissions_total",
        "Submissions by outcome (submitted, invalid, upload_failed, ...)"
    );
    metrics::describe_counter!(
        "tramites_graph_retries_total",
        "Graph requests retried after a 401"
    );
    metrics::describe_counter!(
        "tramites_notifications_failed_total",
        "Best-effort notifications that failed, by channel"
    );
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
