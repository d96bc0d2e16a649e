//! Coordinator module - shared bet state and the one-time draw.
//!
//! Provides:
//! - [`BetCoordinator`] - store, completion barrier, winners broadcast
//! - [`Phase`] - `Collecting` → `Drawing` → `Ready`
//! - [`MarkOutcome`] - what a completion signal caused
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use lottery_coordinator::coordinator::BetCoordinator;
//! use lottery_coordinator::draw::WinningNumbers;
//! use lottery_coordinator::store::MemoryStore;
//!
//! let coordinator = BetCoordinator::new(
//!     2,
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(WinningNumbers::default()),
//! )?;
//!
//! coordinator.store_bets(&bets).await?;
//! coordinator.mark_end_of_bets("1").await?;
//! let winners = coordinator.get_winners("1", Duration::from_secs(60)).await?;
//! ```

mod bet_coordinator;
mod state;

pub use bet_coordinator::{BetCoordinator, DEFAULT_DRAW_ATTEMPTS, DEFAULT_DRAW_BACKOFF};
pub use state::{MarkOutcome, Phase};
