//! The `sift serve` command: run the analysis relay.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Args;
use sift_core::{AnalysisService, Config};

use crate::server;

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides config)
    #[arg(short, long, env = "SIFT_BIND")]
    pub bind: Option<String>,

    /// Comma-separated providers to serve, in comparison order
    #[arg(long, value_delimiter = ',')]
    pub providers: Option<Vec<String>>,
}

pub async fn execute(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(providers) = args.providers {
        config.server.providers = providers;
    }
    anyhow::ensure!(
        !config.server.providers.is_empty(),
        "At least one provider must be enabled"
    );

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {e}", config.server.bind))?;

    let service = Arc::new(AnalysisService::from_config(&config)?);
    let app = server::router(service, &config.server);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, providers = ?config.server.providers, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
