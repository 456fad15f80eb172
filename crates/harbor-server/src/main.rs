// Harbor - S3-compatible replicating reverse proxy
// Copyright (C) 2026 Harbor Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;

use harbor_config::ConfigHandle;
use harbor_metrics::{MetricsConfig, MetricsRegistry, MetricsServer};
use harbor_observability::{init_tracing, LogFormat};
use harbor_server::{create_router, AppState};

/// S3-compatible replicating reverse proxy.
#[derive(Parser, Debug)]
#[command(name = "harbor-server", version, about)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, short = 'c', default_value = "harbor.yaml")]
    config: PathBuf,

    /// Address the proxy listener binds to.
    #[arg(long, default_value = "0.0.0.0:9000")]
    listen: String,

    /// Address the admin server (`/metrics`, `/healthz`, `/status`) binds to.
    #[arg(long, default_value = "127.0.0.1:9090")]
    admin_listen: String,

    /// Log output format: `pretty`, `compact`, or `json`.
    #[arg(long, default_value = "pretty")]
    log_format: String,

    /// Log level, passed through to `RUST_LOG` if unset.
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_log_format(s: &str) -> LogFormat {
    match s {
        "json" => LogFormat::Json,
        "compact" => LogFormat::Compact,
        _ => LogFormat::Pretty,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(parse_log_format(&cli.log_format), cli.log_level.as_deref())
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    tracing::info!(config = %cli.config.display(), "loading configuration");
    let dispatcher = harbor_config::load_dispatcher(&cli.config)
        .await
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    let config_handle = ConfigHandle::new(dispatcher);

    #[cfg(unix)]
    {
        let reload_handle = config_handle.clone();
        let reload_path = cli.config.clone();
        tokio::spawn(harbor_config::watch_for_reload(reload_path, reload_handle));
    }

    let metrics_registry = MetricsRegistry::new().context("failed to build metrics registry")?;
    let state = Arc::new(AppState::new(config_handle, metrics_registry.clone()));

    let admin_addr: std::net::SocketAddr = cli
        .admin_listen
        .parse()
        .with_context(|| format!("invalid --admin-listen address {}", cli.admin_listen))?;
    let status: Arc<dyn harbor_metrics::StatusProvider> = state.clone();
    let admin_config = MetricsConfig {
        port: admin_addr.port(),
        enabled: true,
        bind_address: admin_addr.ip().to_string(),
    };
    let admin_server = MetricsServer::with_config(metrics_registry, status, admin_config);
    let admin_task = tokio::spawn(admin_server.serve());

    let app = create_router(state.clone());
    let listener = TcpListener::bind(&cli.listen)
        .await
        .with_context(|| format!("failed to bind proxy listener on {}", cli.listen))?;
    tracing::info!(addr = %cli.listen, "proxy listening");
    tracing::info!("press Ctrl+C to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("proxy server error")?;

    admin_task.abort();

    tracing::info!("draining in-flight repair records before exit");
    let final_dispatcher = state.config.current();
    match Arc::try_unwrap(final_dispatcher) {
        Ok(dispatcher) => dispatcher.shutdown().await,
        Err(_) => tracing::warn!("dispatcher still has other owners at shutdown, skipping flush"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
