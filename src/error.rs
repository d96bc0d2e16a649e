//! Error types for lottery-coordinator.

use thiserror::Error;

/// Main error type for all lottery operations.
#[derive(Debug, Error)]
pub enum LotteryError {
    /// I/O error during socket or file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while reading or writing stored bets.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed message payload (bad arity, bad number, bad date...).
    #[error("Decode error: {0}")]
    Decode(String),

    /// Payload whose tag is not part of the protocol.
    #[error("Unrecognized message tag: {0:?}")]
    UnknownMessage(String),

    /// Length prefix announces more bytes than the reader accepts.
    #[error("Frame of {len} bytes exceeds maximum {max}")]
    FrameTooLarge { len: u32, max: u32 },

    /// Protocol violation that is not a decode failure.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Peer closed the connection.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Bet persistence failed.
    #[error("Store error: {0}")]
    Store(String),

    /// Waiting for the draw took longer than the allowed deadline.
    #[error("Deadline exceeded while waiting for the draw")]
    DeadlineExceeded,

    /// Peer answered with a message that does not fit the conversation.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for LotteryError {
    fn from(err: config::ConfigError) -> Self {
        LotteryError::Config(err.to_string())
    }
}

/// Result type alias using LotteryError.
pub type Result<T> = std::result::Result<T, LotteryError>;
