//! lexkv server entry point.
//!
//! Sets up logging, the shared store and the TCP listener, then spawns one
//! task per client until Ctrl+C.

use clap::Parser;
use lexkv::commands::CommandHandler;
use lexkv::config::Config;
use lexkv::connection::{handle_connection, ConnectionStats};
use lexkv::storage::Store;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    init_logging(&config)?;

    // Created once, shared by every connection
    let store = Arc::new(Store::new());
    let stats = Arc::new(ConnectionStats::new());

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(
        version = lexkv::VERSION,
        address = %config.bind_address(),
        "lexkv listening"
    );

    tokio::select! {
        _ = accept_loop(listener, Arc::clone(&store), Arc::clone(&stats)) => {}
        result = signal::ctrl_c() => {
            result?;
            info!("Shutdown signal received, stopping server...");
        }
    }

    let store_stats = store.stats();
    info!(
        connections = stats.connections_accepted.load(Ordering::Relaxed),
        commands = stats.commands_processed.load(Ordering::Relaxed),
        protocol_errors = stats.protocol_errors.load(Ordering::Relaxed),
        keys = store_stats.keys,
        expired = store_stats.expired,
        "Server shutdown complete"
    );
    Ok(())
}

/// RUST_LOG wins over `--log-level`.
fn init_logging(config: &Config) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    Ok(())
}

/// Accepts connections forever; accept errors are logged and skipped.
async fn accept_loop(listener: TcpListener, store: Arc<Store>, stats: Arc<ConnectionStats>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler = CommandHandler::new(Arc::clone(&store));
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    handle_connection(stream, addr, handler, stats).await;
                });
            }
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
            }
        }
    }
}
