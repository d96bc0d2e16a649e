//! Agency client - the submitting side of the protocol.
//!
//! The [`AgencyClientBuilder`] configures the client; [`AgencyClient::run`]
//! performs the whole exchange:
//! 1. Send bets in batches, one acknowledgement per batch
//! 2. Send `EndOfBetsMessage`
//! 3. Barrier mode: read the report on the same connection.
//!    Polling mode: reconnect and ask with `WinnersRequestMessage` until the
//!    draw is ready
//!
//! # Example
//!
//! ```ignore
//! use lottery_coordinator::client::{load_bets, AgencyClient};
//!
//! let bets = load_bets("1", "bets.csv").await?;
//! let winners = AgencyClient::builder("1", "server:12345")
//!     .batch_max_amount(50)
//!     .build()
//!     .run(&bets)
//!     .await?;
//! ```

mod bets_file;

use std::time::Duration;

use tokio::net::TcpStream;

pub use bets_file::{load_bets, parse_bets};

use crate::bet::Bet;
use crate::codec::{
    BetBatchMessage, EndOfBetsMessage, Response, Tag, WinnersNotificationMessage,
    WinnersRequestMessage, WireEncode,
};
use crate::config::{ClientConfig, WinnersMode};
use crate::error::{LotteryError, Result};
use crate::protocol::{read_message, write_message, DEFAULT_MAX_FRAME_SIZE};
use crate::transport::connect;

/// Default number of bets per batch.
pub const DEFAULT_BATCH_MAX_AMOUNT: usize = 100;

/// Default pause between two winners queries in polling mode.
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_millis(200);

/// Builder for an [`AgencyClient`].
#[derive(Debug, Clone)]
pub struct AgencyClientBuilder {
    agency: String,
    server_address: String,
    batch_max_amount: usize,
    loop_period: Duration,
    poll_delay: Duration,
    mode: WinnersMode,
    max_frame_size: u32,
}

impl AgencyClientBuilder {
    pub fn new(agency: impl Into<String>, server_address: impl Into<String>) -> Self {
        Self {
            agency: agency.into(),
            server_address: server_address.into(),
            batch_max_amount: DEFAULT_BATCH_MAX_AMOUNT,
            loop_period: Duration::ZERO,
            poll_delay: DEFAULT_POLL_DELAY,
            mode: WinnersMode::default(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Set the maximum number of bets per `BetBatchMessage`.
    ///
    /// Zero is treated as one.
    pub fn batch_max_amount(mut self, amount: usize) -> Self {
        self.batch_max_amount = amount.max(1);
        self
    }

    /// Pause between two batches.
    pub fn loop_period(mut self, period: Duration) -> Self {
        self.loop_period = period;
        self
    }

    /// Pause between two winners queries in polling mode.
    pub fn poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    /// Must match the server's mode.
    pub fn winners_mode(mut self, mode: WinnersMode) -> Self {
        self.mode = mode;
        self
    }

    /// Largest reply accepted from the server.
    pub fn max_frame_size(mut self, limit: u32) -> Self {
        self.max_frame_size = limit;
        self
    }

    pub fn build(self) -> AgencyClient {
        AgencyClient { config: self }
    }
}

/// Submits one agency's bets and fetches its winners.
#[derive(Debug, Clone)]
pub struct AgencyClient {
    config: AgencyClientBuilder,
}

impl AgencyClient {
    pub fn builder(
        agency: impl Into<String>,
        server_address: impl Into<String>,
    ) -> AgencyClientBuilder {
        AgencyClientBuilder::new(agency, server_address)
    }

    /// Client configured from a loaded [`ClientConfig`].
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::builder(&config.id, &config.server_address)
            .batch_max_amount(config.batch_max_amount)
            .loop_period(config.loop_period())
            .poll_delay(config.poll_delay())
            .winners_mode(config.winners_mode)
            .build()
    }

    pub fn agency(&self) -> &str {
        &self.config.agency
    }

    /// Submit `bets`, signal completion and return the winning documents.
    ///
    /// Cancel by dropping the future; the server keeps what was acknowledged.
    pub async fn run(&self, bets: &[Bet]) -> Result<Vec<String>> {
        let mut stream = connect(&self.config.server_address).await?;
        tracing::debug!(agency = self.agency(), addr = %self.config.server_address, "Connected");

        self.send_batches(&mut stream, bets).await?;

        write_message(&mut stream, &EndOfBetsMessage::new(self.agency()).encode()).await?;

        let report = match self.config.mode {
            WinnersMode::Barrier => match self.read_response(&mut stream).await? {
                Response::WinnersReport(report) => report,
                other => {
                    return Err(LotteryError::UnexpectedResponse(format!(
                        "expected {}, got {}",
                        Tag::WinnersNotification,
                        other.tag()
                    )))
                }
            },
            WinnersMode::Polling => {
                drop(stream);
                self.poll_winners().await?
            }
        };

        tracing::info!(
            action = "winners_report",
            result = "success",
            agency = self.agency(),
            winners = report.count()
        );
        Ok(report.documents)
    }

    /// Send `bets` in chunks, requiring a positive acknowledgement for each.
    async fn send_batches(&self, stream: &mut TcpStream, bets: &[Bet]) -> Result<()> {
        let mut sent = 0;

        for (i, chunk) in bets.chunks(self.config.batch_max_amount).enumerate() {
            if i > 0 && !self.config.loop_period.is_zero() {
                tokio::time::sleep(self.config.loop_period).await;
            }

            let message = BetBatchMessage::new(chunk.to_vec());
            write_message(stream, &message.encode()).await?;

            match self.read_response(stream).await? {
                Response::Ack(ack) if ack.success => sent += chunk.len(),
                Response::Ack(_) => {
                    tracing::error!(
                        action = "send_bets",
                        result = "fail",
                        agency = self.agency(),
                        batch = i,
                        sent
                    );
                    return Err(LotteryError::Store(format!(
                        "server rejected batch {} of agency {}",
                        i,
                        self.agency()
                    )));
                }
                other => {
                    return Err(LotteryError::UnexpectedResponse(format!(
                        "expected {}, got {}",
                        Tag::Ack,
                        other.tag()
                    )))
                }
            }
        }

        tracing::info!(action = "send_bets", result = "success", agency = self.agency(), sent);
        Ok(())
    }

    /// One short connection per query until the draw is ready.
    async fn poll_winners(&self) -> Result<WinnersNotificationMessage> {
        let query = WinnersRequestMessage::new(self.agency()).encode();

        loop {
            let mut stream = connect(&self.config.server_address).await?;
            write_message(&mut stream, &query).await?;

            match self.read_response(&mut stream).await? {
                Response::WinnersReport(report) => return Ok(report),
                Response::WinnersPending(_) => {
                    tracing::debug!(agency = self.agency(), "Draw pending");
                }
                other => {
                    return Err(LotteryError::UnexpectedResponse(format!(
                        "expected {}, got {}",
                        Tag::WinnersNotification,
                        other.tag()
                    )))
                }
            }

            drop(stream);
            tokio::time::sleep(self.config.poll_delay).await;
        }
    }

    async fn read_response(&self, stream: &mut TcpStream) -> Result<Response> {
        let payload = read_message(stream, self.config.max_frame_size).await?;
        Response::decode(&payload)
    }
}
