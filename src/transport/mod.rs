//! Transport module - TCP sockets for the server and the agency client.

mod tcp;

pub use tcp::{bind_listener, connect};
