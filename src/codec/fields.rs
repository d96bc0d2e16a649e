//! Tags, delimiters and field splitting shared by every message.

use std::fmt;

use crate::error::{LotteryError, Result};

/// Separates the tag and the fields of one message.
pub const FIELD_DELIMITER: char = '^';

/// Separates whole records (batched bets, winner documents).
pub const RECORD_DELIMITER: char = '~';

/// Leading token of an encoded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Bet,
    BetBatch,
    EndOfBets,
    Ack,
    WinnersNotification,
    WinnersRequest,
    WinnersPending,
}

impl Tag {
    /// All tags known to the protocol.
    pub const ALL: [Tag; 7] = [
        Tag::Bet,
        Tag::BetBatch,
        Tag::EndOfBets,
        Tag::Ack,
        Tag::WinnersNotification,
        Tag::WinnersRequest,
        Tag::WinnersPending,
    ];

    /// Wire spelling of the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Bet => "BetMessage",
            Tag::BetBatch => "BetBatchMessage",
            Tag::EndOfBets => "EndOfBetsMessage",
            Tag::Ack => "AckMessage",
            Tag::WinnersNotification => "WinnersNotificationMessage",
            Tag::WinnersRequest => "WinnersRequestMessage",
            Tag::WinnersPending => "WinnersPendingMessage",
        }
    }

    /// Look up a tag by its exact (case-sensitive) wire spelling.
    pub fn from_name(name: &str) -> Option<Tag> {
        Tag::ALL.into_iter().find(|tag| tag.as_str() == name)
    }

    /// Identify the tag of an encoded message without decoding it.
    ///
    /// Never fails: malformed input simply yields `None`.
    pub fn sniff(payload: &[u8]) -> Option<Tag> {
        std::str::from_utf8(payload)
            .ok()
            .and_then(|text| Tag::from_name(tag_token(text)))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text up to the first delimiter of either kind.
pub fn tag_token(text: &str) -> &str {
    text.split([FIELD_DELIMITER, RECORD_DELIMITER])
        .next()
        .unwrap_or_default()
}

/// View a payload as text; the protocol is UTF-8 only.
pub fn payload_text(payload: &[u8]) -> Result<&str> {
    std::str::from_utf8(payload)
        .map_err(|e| LotteryError::Decode(format!("payload is not UTF-8: {e}")))
}

/// Split `text` on the field delimiter, check the tag, and require exactly
/// `arity` fields after it.
pub fn split_fields<'a>(text: &'a str, tag: Tag, arity: usize) -> Result<Vec<&'a str>> {
    let mut parts = text.split(FIELD_DELIMITER);
    let head = parts.next().unwrap_or_default();
    if head != tag.as_str() {
        return Err(LotteryError::Decode(format!(
            "invalid tag: expected {tag}, got {head:?}"
        )));
    }

    let fields: Vec<&str> = parts.collect();
    if fields.len() != arity {
        return Err(LotteryError::Decode(format!(
            "invalid {tag} format: expected {arity} fields, got {}",
            fields.len()
        )));
    }
    Ok(fields)
}

/// Parse a numeric field, naming it in the error.
pub fn parse_number<T: std::str::FromStr>(value: &str, name: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| LotteryError::Decode(format!("invalid {name}: {value:?} is not a number")))
}

/// Require a non-empty identifier field, naming it in the error.
pub fn non_empty<'a>(value: &'a str, name: &str) -> Result<&'a str> {
    if value.is_empty() {
        return Err(LotteryError::Decode(format!("{name} must not be empty")));
    }
    Ok(value)
}
