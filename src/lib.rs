//! # lottery-coordinator
//!
//! Bet collection server and one-time lottery draw for a fixed set of
//! agencies.
//!
//! Agencies connect over TCP, submit bets, and signal when they are done.
//! Once every agency has signaled, the server runs the draw exactly once and
//! hands each agency its winners.
//!
//! ## Architecture
//!
//! - **Protocol** (`protocol`): 4-byte big-endian length prefix + payload
//! - **Codec** (`codec`): tagged text messages, `^` between fields, `~`
//!   between records
//! - **Coordinator** (`coordinator`): shared state, completion barrier and
//!   winners broadcast
//! - **Server / client** (`server`, `client`): both ends of a session
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lottery_coordinator::{BetCoordinator, JsonLinesStore, RequestRouter, Server, WinningNumbers};
//!
//! #[tokio::main]
//! async fn main() -> lottery_coordinator::Result<()> {
//!     let coordinator = BetCoordinator::new(
//!         5,
//!         Arc::new(JsonLinesStore::new("bets.jsonl")),
//!         Arc::new(WinningNumbers::default()),
//!     )?;
//!     let router = RequestRouter::new(Arc::new(coordinator));
//!
//!     let listener = lottery_coordinator::transport::bind_listener(([0, 0, 0, 0], 12345).into(), 128)?;
//!     Server::from_listener(listener, router)
//!         .run(async { tokio::signal::ctrl_c().await.ok(); })
//!         .await
//! }
//! ```

pub mod bet;
pub mod client;
pub mod codec;
pub mod config;
pub mod coordinator;
pub mod draw;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod runtime;
pub mod server;
pub mod store;
pub mod transport;

pub use bet::Bet;
pub use client::{AgencyClient, AgencyClientBuilder};
pub use coordinator::{BetCoordinator, MarkOutcome, Phase};
pub use draw::{DrawPredicate, WinningNumbers};
pub use error::{LotteryError, Result};
pub use handler::{RequestContext, RequestRouter};
pub use server::Server;
pub use store::{BetStore, JsonLinesStore, MemoryStore};
