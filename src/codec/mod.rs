//! Codec module - text encoding of protocol messages.
//!
//! Every message is a tag followed by `^`-separated fields; batches join
//! whole records with `~`. See [`messages`] for the exact grammar.
//!
//! # Design
//!
//! - [`Tag::sniff`] reads the tag once; [`Request::decode`] and
//!   [`Response::decode`] switch on it, so there is no probing of
//!   candidate variants in priority order.
//! - Encoding and decoding are two traits, [`WireEncode`] and
//!   [`WireDecode`], implemented per message struct.
//!
//! # Example
//!
//! ```
//! use lottery_coordinator::codec::{AckMessage, Response, WireEncode};
//!
//! let bytes = AckMessage::new(true).encode();
//! assert_eq!(&bytes[..], b"AckMessage^true");
//! assert_eq!(Response::decode(&bytes).unwrap(), Response::Ack(AckMessage::new(true)));
//! ```

mod fields;
pub mod messages;

use bytes::Bytes;

pub use fields::{payload_text, tag_token, Tag, FIELD_DELIMITER, RECORD_DELIMITER};
pub use messages::{
    AckMessage, BetBatchMessage, BetMessage, EndOfBetsMessage, WinnersNotificationMessage,
    WinnersPendingMessage, WinnersRequestMessage,
};

use crate::error::{LotteryError, Result};

/// A message type with a fixed wire tag.
pub trait Tagged {
    const TAG: Tag;

    /// Cheap check whether `payload` carries this message's tag.
    fn matches(payload: &[u8]) -> bool {
        Tag::sniff(payload) == Some(Self::TAG)
    }
}

/// Messages that can be written to the wire.
pub trait WireEncode: Tagged {
    /// Append the encoded message to `out`.
    fn encode_into(&self, out: &mut String);

    /// Encode into a fresh buffer.
    fn encode(&self) -> Bytes {
        let mut out = String::new();
        self.encode_into(&mut out);
        Bytes::from(out)
    }
}

/// Messages that can be read from the wire.
pub trait WireDecode: Tagged + Sized {
    /// Decode from text; strict about tag, arity and numeric fields.
    fn decode_str(text: &str) -> Result<Self>;

    /// Decode from a raw payload.
    fn decode(payload: &[u8]) -> Result<Self> {
        Self::decode_str(payload_text(payload)?)
    }
}

/// Messages an agency sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Bet(BetMessage),
    BetBatch(BetBatchMessage),
    EndOfBets(EndOfBetsMessage),
    WinnersQuery(WinnersRequestMessage),
}

impl Request {
    /// Decode a request, dispatching once on its tag.
    ///
    /// # Errors
    ///
    /// [`LotteryError::UnknownMessage`] if the tag is not a request tag,
    /// [`LotteryError::Decode`] if the body is malformed.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let text = payload_text(payload)?;
        let token = tag_token(text);
        match Tag::from_name(token) {
            Some(Tag::Bet) => BetMessage::decode_str(text).map(Request::Bet),
            Some(Tag::BetBatch) => BetBatchMessage::decode_str(text).map(Request::BetBatch),
            Some(Tag::EndOfBets) => EndOfBetsMessage::decode_str(text).map(Request::EndOfBets),
            Some(Tag::WinnersRequest) => {
                WinnersRequestMessage::decode_str(text).map(Request::WinnersQuery)
            }
            _ => Err(LotteryError::UnknownMessage(token.to_string())),
        }
    }

    /// Encode the wrapped message.
    pub fn encode(&self) -> Bytes {
        match self {
            Request::Bet(m) => m.encode(),
            Request::BetBatch(m) => m.encode(),
            Request::EndOfBets(m) => m.encode(),
            Request::WinnersQuery(m) => m.encode(),
        }
    }

    /// Tag of the wrapped message.
    pub fn tag(&self) -> Tag {
        match self {
            Request::Bet(_) => BetMessage::TAG,
            Request::BetBatch(_) => BetBatchMessage::TAG,
            Request::EndOfBets(_) => EndOfBetsMessage::TAG,
            Request::WinnersQuery(_) => WinnersRequestMessage::TAG,
        }
    }
}

/// Messages the server sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ack(AckMessage),
    WinnersPending(WinnersPendingMessage),
    WinnersReport(WinnersNotificationMessage),
}

impl Response {
    /// Decode a response, dispatching once on its tag.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let text = payload_text(payload)?;
        let token = tag_token(text);
        match Tag::from_name(token) {
            Some(Tag::Ack) => AckMessage::decode_str(text).map(Response::Ack),
            Some(Tag::WinnersPending) => {
                WinnersPendingMessage::decode_str(text).map(Response::WinnersPending)
            }
            Some(Tag::WinnersNotification) => {
                WinnersNotificationMessage::decode_str(text).map(Response::WinnersReport)
            }
            _ => Err(LotteryError::UnknownMessage(token.to_string())),
        }
    }

    /// Encode the wrapped message.
    pub fn encode(&self) -> Bytes {
        match self {
            Response::Ack(m) => m.encode(),
            Response::WinnersPending(m) => m.encode(),
            Response::WinnersReport(m) => m.encode(),
        }
    }

    /// Tag of the wrapped message.
    pub fn tag(&self) -> Tag {
        match self {
            Response::Ack(_) => AckMessage::TAG,
            Response::WinnersPending(_) => WinnersPendingMessage::TAG,
            Response::WinnersReport(_) => WinnersNotificationMessage::TAG,
        }
    }
}
