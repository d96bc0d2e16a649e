//! Handler module - request dispatch.
//!
//! Provides:
//! - [`RequestRouter`] - decodes a payload and calls into the coordinator
//! - [`RequestContext`] - identifies the connection a request came from
//!
//! # Example
//!
//! ```ignore
//! use lottery_coordinator::config::WinnersMode;
//! use lottery_coordinator::handler::{RequestContext, RequestRouter};
//!
//! let router = RequestRouter::new(coordinator).winners_mode(WinnersMode::Polling);
//!
//! if let Some(reply) = router.handle(&payload, RequestContext::new(1)).await? {
//!     write_message(&mut stream, &reply).await?;
//! }
//! ```

mod context;
mod router;

pub use context::RequestContext;
pub use router::{RequestRouter, DEFAULT_WINNERS_TIMEOUT};
