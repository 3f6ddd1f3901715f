//! URL filter server binary

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use filter_server::{CliArgs, CommandServer};

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG overrides the default level
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = CliArgs::parse()
        .into_config()
        .context("Invalid filter configuration")?;

    let server = CommandServer::bind(config)
        .await
        .context("Failed to start filter server")?;

    info!("Press Ctrl+C to stop.");
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}
