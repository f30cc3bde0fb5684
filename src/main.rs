//! Transfer Gateway
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌───────────┐    ┌──────────┐
//! │   HTTP   │───▶│ Validator │───▶│ Publisher │───▶│  Kafka   │
//! │ (axum)   │    │           │    │ (acks=all)│    │ (topic)  │
//! └──────────┘    └───────────┘    └───────────┘    └──────────┘
//! ```
//!
//! Startup order: config → logging → broker connection (bounded retry) →
//! HTTP listener. No traffic is accepted before the broker is connected.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use transfer_gateway::bootstrap::connect_kafka;
use transfer_gateway::config::AppConfig;
use transfer_gateway::gateway::{self, state::AppState};
use transfer_gateway::logging::init_logging;
use transfer_gateway::publisher::{EventPublisher, InMemoryPublisher};

#[derive(Debug, Parser)]
#[command(name = "transfer_gateway", version, about = "Fund-transfer ingestion gateway")]
struct Cli {
    /// Config environment; loads config/<env>.yaml
    #[arg(short, long, default_value = "dev")]
    env: String,

    /// Override server.port
    #[arg(long)]
    port: Option<u16>,

    /// Record events in memory instead of publishing to Kafka
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut app_config = AppConfig::load(&cli.env)
        .with_context(|| format!("loading config for env '{}'", cli.env))?;
    if let Some(port) = cli.port {
        app_config.server.port = port;
    }
    let _log_guard = init_logging(&app_config);

    tracing::info!("Starting Transfer Gateway in {} mode", cli.env);

    let publisher: Arc<dyn EventPublisher> = if cli.dry_run {
        tracing::warn!("Dry run: events are recorded in memory, nothing reaches Kafka");
        Arc::new(InMemoryPublisher::new(app_config.kafka.topic.clone(), 1))
    } else {
        Arc::new(
            connect_kafka(&app_config.kafka)
                .await
                .context("Failed to connect to Kafka")?,
        )
    };

    let state = Arc::new(AppState::new(publisher.clone()));
    let served = gateway::run_server(&app_config.server, state, shutdown_signal()).await;

    // Release the broker connection whether or not the server exited cleanly
    publisher.close().await.context("closing publisher")?;
    served.context("gateway server error")?;

    tracing::info!("Transfer Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}
