use std::sync::Arc;

use anyhow::Context;
use lottery_coordinator::config::ServerConfig;
use lottery_coordinator::runtime::{init_logging, shutdown_signal};
use lottery_coordinator::{BetCoordinator, JsonLinesStore, RequestRouter, Server, WinningNumbers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("Failed to load server configuration")?;
    init_logging(&config.log_level);

    tracing::info!(
        total_agencies = config.total_agencies,
        port = config.port,
        winners_mode = %config.winners_mode,
        storage_path = %config.storage_path,
        "Starting lottery server"
    );

    let store = Arc::new(JsonLinesStore::new(&config.storage_path));
    let predicate = Arc::new(WinningNumbers::new(config.winning_numbers.iter().copied()));
    let coordinator = BetCoordinator::new(config.total_agencies, store, predicate)?
        .draw_retry(config.draw_attempts, config.draw_backoff());

    let router = RequestRouter::new(Arc::new(coordinator))
        .winners_mode(config.winners_mode)
        .winners_timeout(config.winners_timeout());

    let server = Server::bind(&config, router)
        .with_context(|| format!("Failed to listen on port {}", config.port))?;
    server.run(shutdown_signal()).await?;

    tracing::info!("Server stopped");
    Ok(())
}
