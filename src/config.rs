//! Server and client configuration.
//!
//! Sources, later ones winning: built-in defaults, an optional TOML file,
//! then `LOTTERY_*` environment variables (`__` separates nested keys).

use std::fmt;
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::coordinator::DEFAULT_DRAW_ATTEMPTS;
use crate::draw::DEFAULT_WINNING_NUMBER;
use crate::error::{LotteryError, Result};
use crate::protocol::DEFAULT_MAX_FRAME_SIZE;

const ENV_PREFIX: &str = "LOTTERY";

/// How an agency learns its winners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WinnersMode {
    /// `EndOfBetsMessage` blocks until the draw and is answered with the report.
    #[default]
    Barrier,
    /// `EndOfBetsMessage` gets no reply; the agency polls with `WinnersRequestMessage`.
    Polling,
}

impl fmt::Display for WinnersMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinnersMode::Barrier => f.write_str("barrier"),
            WinnersMode::Polling => f.write_str("polling"),
        }
    }
}

/// Configuration of the lottery server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Agencies that must signal completion before the draw. Required.
    pub total_agencies: usize,
    pub port: u16,
    pub listen_backlog: u32,
    /// JSON-lines file holding every stored bet.
    pub storage_path: String,
    pub winning_numbers: Vec<u32>,
    pub winners_mode: WinnersMode,
    /// Longest a barrier-mode `EndOfBetsMessage` waits for the draw.
    pub winners_timeout_secs: u64,
    /// Store scans tried by one draw before it is reported as failed.
    pub draw_attempts: u32,
    /// Pause between two scans of the same draw.
    pub draw_backoff_ms: u64,
    /// Connections served at once; extra connections are dropped.
    pub max_connections: usize,
    pub max_frame_size: u32,
    pub log_level: String,
}

impl ServerConfig {
    /// Load from `config/server.toml` and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from("config")
    }

    /// Load from `<config_dir>/server.toml` and the environment.
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let builder = Config::builder()
            .set_default("port", 12345)?
            .set_default("listen_backlog", 128)?
            .set_default("storage_path", "bets.jsonl")?
            .set_default("winning_numbers", vec![i64::from(DEFAULT_WINNING_NUMBER)])?
            .set_default("winners_mode", "barrier")?
            .set_default("winners_timeout_secs", 300)?
            .set_default("draw_attempts", i64::from(DEFAULT_DRAW_ATTEMPTS))?
            .set_default("draw_backoff_ms", 100)?
            .set_default("max_connections", 256)?
            .set_default("max_frame_size", i64::from(DEFAULT_MAX_FRAME_SIZE))?
            .set_default("log_level", "info")?
            .add_source(File::from(config_dir.as_ref().join("server.toml")).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("winning_numbers"),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.total_agencies == 0 {
            return Err(LotteryError::Config(
                "total_agencies must be greater than zero".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(LotteryError::Config(
                "max_connections must be greater than zero".to_string(),
            ));
        }
        // Every agency holds a connection while it waits at the barrier.
        if self.winners_mode == WinnersMode::Barrier && self.max_connections < self.total_agencies {
            return Err(LotteryError::Config(format!(
                "max_connections ({}) must be at least total_agencies ({}) in barrier mode",
                self.max_connections, self.total_agencies
            )));
        }
        if self.draw_attempts == 0 {
            return Err(LotteryError::Config(
                "draw_attempts must be greater than zero".to_string(),
            ));
        }
        if self.max_frame_size == 0 {
            return Err(LotteryError::Config(
                "max_frame_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn winners_timeout(&self) -> Duration {
        Duration::from_secs(self.winners_timeout_secs)
    }

    pub fn draw_backoff(&self) -> Duration {
        Duration::from_millis(self.draw_backoff_ms)
    }
}

/// Configuration of an agency client.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Agency identifier. Required.
    pub id: String,
    /// `host:port` of the server. Required.
    pub server_address: String,
    pub bets_path: String,
    /// Most bets sent in one `BetBatchMessage`.
    pub batch_max_amount: usize,
    /// Pause between batches.
    pub loop_period_ms: u64,
    /// Pause between two winners queries in polling mode.
    pub poll_delay_ms: u64,
    pub winners_mode: WinnersMode,
    pub log_level: String,
}

impl ClientConfig {
    /// Load from `config/client.toml` and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from("config")
    }

    /// Load from `<config_dir>/client.toml` and the environment.
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let builder = Config::builder()
            .set_default("bets_path", "bets.csv")?
            .set_default("batch_max_amount", 100)?
            .set_default("loop_period_ms", 0)?
            .set_default("poll_delay_ms", 200)?
            .set_default("winners_mode", "barrier")?
            .set_default("log_level", "info")?
            .add_source(File::from(config_dir.as_ref().join("client.toml")).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the client cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(LotteryError::Config("id must not be empty".to_string()));
        }
        if self.server_address.trim().is_empty() {
            return Err(LotteryError::Config(
                "server_address must not be empty".to_string(),
            ));
        }
        if self.batch_max_amount == 0 {
            return Err(LotteryError::Config(
                "batch_max_amount must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn loop_period(&self) -> Duration {
        Duration::from_millis(self.loop_period_ms)
    }

    pub fn poll_delay(&self) -> Duration {
        Duration::from_millis(self.poll_delay_ms)
    }
}
