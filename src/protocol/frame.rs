//! Whole-message reads and writes over a byte stream.
//!
//! A stream only guarantees byte order, so both directions loop until the
//! full prefix and payload have moved:
//! - [`read_message`] reads exactly 4 prefix bytes, then exactly `length`
//!   payload bytes. A zero-length read means the peer closed.
//! - [`write_message`] keeps writing until the kernel accepted every byte.
//!   A zero-byte write is fatal.
//!
//! # Example
//!
//! ```ignore
//! use lottery_coordinator::protocol::{read_message, write_message, DEFAULT_MAX_FRAME_SIZE};
//!
//! write_message(&mut stream, b"EndOfBetsMessage^1").await?;
//! let reply = read_message(&mut stream, DEFAULT_MAX_FRAME_SIZE).await?;
//! ```

use std::io::IoSlice;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::wire_format::{LengthPrefix, LENGTH_PREFIX_SIZE};
use crate::error::{LotteryError, Result};

/// Build a complete frame (prefix + payload) in one buffer.
pub fn build_frame(payload: &[u8]) -> Result<Vec<u8>> {
    let prefix = LengthPrefix::for_payload(payload)?;
    let mut frame = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    frame.extend_from_slice(&prefix.encode());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Read one message payload.
///
/// # Errors
///
/// - [`LotteryError::ConnectionClosed`] if the peer closes before the frame
///   is complete (including before its first byte).
/// - [`LotteryError::FrameTooLarge`] if the prefix exceeds `max_frame_size`.
pub async fn read_message<R>(reader: &mut R, max_frame_size: u32) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut prefix_buf = [0u8; LENGTH_PREFIX_SIZE];
    read_full(reader, &mut prefix_buf).await?;

    let prefix = LengthPrefix::decode(&prefix_buf)
        .ok_or_else(|| LotteryError::Protocol("Short length prefix".to_string()))?;
    prefix.validate(max_frame_size)?;

    if prefix.is_empty() {
        return Ok(Bytes::new());
    }

    let mut payload = BytesMut::zeroed(prefix.len());
    read_full(reader, &mut payload).await?;
    Ok(payload.freeze())
}

/// Fill `buf` completely, looping over short reads.
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            return Err(LotteryError::ConnectionClosed);
        }
        filled += n;
    }
    Ok(())
}

/// Write one message payload with its length prefix.
///
/// Uses scatter/gather I/O so prefix and payload usually leave in a single
/// syscall; partial writes are resumed from the first unsent byte.
pub async fn write_message<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let prefix = LengthPrefix::for_payload(payload)?.encode();
    let total_size = LENGTH_PREFIX_SIZE + payload.len();

    let mut total_written = 0;
    while total_written < total_size {
        let slices = remaining_slices(&prefix, payload, total_written);
        let written = writer.write_vectored(&slices).await?;
        if written == 0 {
            return Err(LotteryError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "write_vectored returned 0",
            )));
        }
        total_written += written;
    }

    writer.flush().await?;
    Ok(())
}

/// IoSlices for whatever is left after `skip` bytes were written.
fn remaining_slices<'a>(
    prefix: &'a [u8; LENGTH_PREFIX_SIZE],
    payload: &'a [u8],
    skip: usize,
) -> Vec<IoSlice<'a>> {
    let mut slices = Vec::with_capacity(2);
    if skip < LENGTH_PREFIX_SIZE {
        slices.push(IoSlice::new(&prefix[skip..]));
    }
    let payload_skip = skip.saturating_sub(LENGTH_PREFIX_SIZE);
    if payload_skip < payload.len() {
        slices.push(IoSlice::new(&payload[payload_skip..]));
    }
    slices
}
