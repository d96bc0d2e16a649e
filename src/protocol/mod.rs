//! Protocol module - length-prefixed framing.
//!
//! This module implements the transport layer of the bet protocol:
//! - 4-byte big-endian length prefix encoding/decoding
//! - Whole-message reads and writes over any async byte stream

mod frame;
mod wire_format;

pub use frame::{build_frame, read_message, write_message};
pub use wire_format::{LengthPrefix, DEFAULT_MAX_FRAME_SIZE, LENGTH_PREFIX_SIZE};
