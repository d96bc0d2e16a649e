//! Store module - persistence of submitted bets.
//!
//! Provides:
//! - [`BetStore`] - append/scan contract used by the coordinator
//! - [`JsonLinesStore`] - one JSON object per line in a file
//! - [`MemoryStore`] - in-process vector, for tests and embedding

mod json_lines;
mod memory;

use std::future::Future;
use std::pin::Pin;

pub use json_lines::JsonLinesStore;
pub use memory::MemoryStore;

use crate::bet::Bet;
use crate::error::Result;

/// Boxed future returned by store operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Durable storage of bets.
///
/// Implementations report failures as [`crate::LotteryError::Store`] so the
/// router can answer with a failed acknowledgement instead of dropping the
/// connection.
pub trait BetStore: Send + Sync + 'static {
    /// Append `bets` in order. Either all of them are stored or the call fails.
    fn append<'a>(&'a self, bets: &'a [Bet]) -> BoxFuture<'a, Result<()>>;

    /// Read back every stored bet in append order.
    fn load(&self) -> BoxFuture<'_, Result<Vec<Bet>>>;
}
