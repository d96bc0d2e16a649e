use anyhow::Context;
use lottery_coordinator::client::load_bets;
use lottery_coordinator::config::ClientConfig;
use lottery_coordinator::runtime::{init_logging, shutdown_signal};
use lottery_coordinator::AgencyClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::load().context("Failed to load client configuration")?;
    init_logging(&config.log_level);

    let bets = load_bets(&config.id, &config.bets_path)
        .await
        .with_context(|| format!("Failed to read bets from {}", config.bets_path))?;

    tracing::info!(
        agency = %config.id,
        server = %config.server_address,
        bets = bets.len(),
        winners_mode = %config.winners_mode,
        "Starting agency client"
    );

    let client = AgencyClient::from_config(&config);

    tokio::select! {
        result = client.run(&bets) => {
            let winners = result.context("Lottery exchange failed")?;
            tracing::info!(
                action = "finished",
                result = "success",
                agency = %config.id,
                winners = winners.len()
            );
        }
        _ = shutdown_signal() => {
            tracing::info!(agency = %config.id, "Interrupted before the draw was received");
        }
    }

    Ok(())
}
