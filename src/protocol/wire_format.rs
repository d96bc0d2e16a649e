//! Wire format of the frame prefix.
//!
//! Every message travels as:
//! ```text
//! ┌──────────────┬──────────────────────┐
//! │ Length       │ Payload              │
//! │ 4 bytes      │ `Length` bytes       │
//! │ uint32 BE    │ encoded message text │
//! └──────────────┴──────────────────────┘
//! ```

use crate::error::{LotteryError, Result};

/// Length prefix size in bytes (fixed, exactly 4).
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default maximum payload size accepted by readers (8 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 8 * 1024 * 1024;

/// Decoded length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthPrefix {
    /// Payload length in bytes.
    pub payload_length: u32,
}

impl LengthPrefix {
    /// Create a new prefix.
    pub fn new(payload_length: u32) -> Self {
        Self { payload_length }
    }

    /// Prefix for a payload, failing if it cannot be represented in 32 bits.
    pub fn for_payload(payload: &[u8]) -> Result<Self> {
        let payload_length = u32::try_from(payload.len()).map_err(|_| {
            LotteryError::Protocol(format!(
                "Payload of {} bytes does not fit a 32-bit length prefix",
                payload.len()
            ))
        })?;
        Ok(Self { payload_length })
    }

    /// Encode prefix to bytes (Big Endian).
    ///
    /// # Example
    ///
    /// ```
    /// use lottery_coordinator::protocol::LengthPrefix;
    ///
    /// assert_eq!(LengthPrefix::new(258).encode(), [0, 0, 1, 2]);
    /// ```
    pub fn encode(&self) -> [u8; LENGTH_PREFIX_SIZE] {
        self.payload_length.to_be_bytes()
    }

    /// Decode prefix from bytes (Big Endian).
    ///
    /// Returns `None` if buffer is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < LENGTH_PREFIX_SIZE {
            return None;
        }
        Some(Self {
            payload_length: u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
        })
    }

    /// Reject prefixes announcing more than `max_payload_size` bytes.
    pub fn validate(&self, max_payload_size: u32) -> Result<()> {
        if self.payload_length > max_payload_size {
            return Err(LotteryError::FrameTooLarge {
                len: self.payload_length,
                max: max_payload_size,
            });
        }
        Ok(())
    }

    /// Payload length as `usize`.
    #[inline]
    pub fn len(&self) -> usize {
        self.payload_length as usize
    }

    /// Check if the frame carries no payload.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload_length == 0
    }
}
