//! Message structs and their wire encodings.
//!
//! ```text
//! BetMessage^agency^first^last^document^birthdate^number
//! BetBatchMessage~BetMessage^...~BetMessage^...
//! EndOfBetsMessage^agency
//! AckMessage^true
//! WinnersRequestMessage^agency
//! WinnersPendingMessage
//! WinnersNotificationMessage^count^doc1~doc2
//! ```

use chrono::NaiveDate;

use super::fields::{
    non_empty, parse_number, split_fields, Tag, FIELD_DELIMITER, RECORD_DELIMITER,
};
use super::{Tagged, WireDecode, WireEncode};
use crate::bet::{Bet, BIRTHDATE_FORMAT};
use crate::error::{LotteryError, Result};

/// A single bet submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetMessage {
    pub bet: Bet,
}

impl BetMessage {
    pub fn new(bet: Bet) -> Self {
        Self { bet }
    }
}

impl Tagged for BetMessage {
    const TAG: Tag = Tag::Bet;
}

impl WireEncode for BetMessage {
    fn encode_into(&self, out: &mut String) {
        encode_bet(&self.bet, out);
    }
}

fn encode_bet(bet: &Bet, out: &mut String) {
    let birthdate = bet.birthdate.format(BIRTHDATE_FORMAT).to_string();
    let number = bet.number.to_string();

    out.push_str(Tag::Bet.as_str());
    for field in [
        bet.agency.as_str(),
        bet.first_name.as_str(),
        bet.last_name.as_str(),
        bet.document.as_str(),
        birthdate.as_str(),
        number.as_str(),
    ] {
        out.push(FIELD_DELIMITER);
        out.push_str(field);
    }
}

/// Tag, one delimiter, one field.
fn encode_single(tag: Tag, field: &str, out: &mut String) {
    out.push_str(tag.as_str());
    out.push(FIELD_DELIMITER);
    out.push_str(field);
}

impl WireDecode for BetMessage {
    fn decode_str(text: &str) -> Result<Self> {
        let fields = split_fields(text, Self::TAG, 6)?;
        let agency = non_empty(fields[0], "agency")?;
        let document = non_empty(fields[3], "document")?;
        let birthdate = NaiveDate::parse_from_str(fields[4], BIRTHDATE_FORMAT).map_err(|e| {
            LotteryError::Decode(format!("invalid birthdate {:?}: {e}", fields[4]))
        })?;
        let number = parse_number(fields[5], "number")?;

        Ok(Self::new(Bet::new(
            agency, fields[1], fields[2], document, birthdate, number,
        )))
    }
}

/// An ordered group of bets stored as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetBatchMessage {
    pub bets: Vec<Bet>,
}

impl BetBatchMessage {
    pub fn new(bets: Vec<Bet>) -> Self {
        Self { bets }
    }
}

impl Tagged for BetBatchMessage {
    const TAG: Tag = Tag::BetBatch;
}

impl WireEncode for BetBatchMessage {
    fn encode_into(&self, out: &mut String) {
        out.push_str(Self::TAG.as_str());
        for bet in &self.bets {
            out.push(RECORD_DELIMITER);
            encode_bet(bet, out);
        }
    }
}

impl WireDecode for BetBatchMessage {
    fn decode_str(text: &str) -> Result<Self> {
        let mut records = text.split(RECORD_DELIMITER);
        let head = records.next().unwrap_or_default();
        if head != Self::TAG.as_str() {
            return Err(LotteryError::Decode(format!(
                "invalid tag: expected {}, got {head:?}",
                Self::TAG
            )));
        }

        let bets = records
            .map(|record| BetMessage::decode_str(record).map(|m| m.bet))
            .collect::<Result<Vec<_>>>()?;
        if bets.is_empty() {
            return Err(LotteryError::Decode(
                "BetBatchMessage carries no bets".to_string(),
            ));
        }
        Ok(Self::new(bets))
    }
}

/// An agency's signal that it has no more bets to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfBetsMessage {
    pub agency: String,
}

impl EndOfBetsMessage {
    pub fn new(agency: impl Into<String>) -> Self {
        Self {
            agency: agency.into(),
        }
    }
}

impl Tagged for EndOfBetsMessage {
    const TAG: Tag = Tag::EndOfBets;
}

impl WireEncode for EndOfBetsMessage {
    fn encode_into(&self, out: &mut String) {
        encode_single(Self::TAG, &self.agency, out);
    }
}

impl WireDecode for EndOfBetsMessage {
    fn decode_str(text: &str) -> Result<Self> {
        let fields = split_fields(text, Self::TAG, 1)?;
        Ok(Self::new(non_empty(fields[0], "agency")?))
    }
}

/// Outcome of a bet or batch submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckMessage {
    pub success: bool,
}

impl AckMessage {
    pub fn new(success: bool) -> Self {
        Self { success }
    }
}

impl Tagged for AckMessage {
    const TAG: Tag = Tag::Ack;
}

impl WireEncode for AckMessage {
    fn encode_into(&self, out: &mut String) {
        encode_single(Self::TAG, if self.success { "true" } else { "false" }, out);
    }
}

impl WireDecode for AckMessage {
    fn decode_str(text: &str) -> Result<Self> {
        let fields = split_fields(text, Self::TAG, 1)?;
        // Peers written in other languages spell booleans `True`/`False`.
        let success = if fields[0].eq_ignore_ascii_case("true") {
            true
        } else if fields[0].eq_ignore_ascii_case("false") {
            false
        } else {
            return Err(LotteryError::Decode(format!(
                "invalid success flag: {:?}",
                fields[0]
            )));
        };
        Ok(Self::new(success))
    }
}

/// Non-blocking question "is my draw ready?".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnersRequestMessage {
    pub agency: String,
}

impl WinnersRequestMessage {
    pub fn new(agency: impl Into<String>) -> Self {
        Self {
            agency: agency.into(),
        }
    }
}

impl Tagged for WinnersRequestMessage {
    const TAG: Tag = Tag::WinnersRequest;
}

impl WireEncode for WinnersRequestMessage {
    fn encode_into(&self, out: &mut String) {
        encode_single(Self::TAG, &self.agency, out);
    }
}

impl WireDecode for WinnersRequestMessage {
    fn decode_str(text: &str) -> Result<Self> {
        let fields = split_fields(text, Self::TAG, 1)?;
        Ok(Self::new(non_empty(fields[0], "agency")?))
    }
}

/// The draw has not happened yet; ask again later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WinnersPendingMessage;

impl Tagged for WinnersPendingMessage {
    const TAG: Tag = Tag::WinnersPending;
}

impl WireEncode for WinnersPendingMessage {
    fn encode_into(&self, out: &mut String) {
        out.push_str(Self::TAG.as_str());
    }
}

impl WireDecode for WinnersPendingMessage {
    fn decode_str(text: &str) -> Result<Self> {
        split_fields(text, Self::TAG, 0)?;
        Ok(Self)
    }
}

/// Documents of an agency's winning bets, in store order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WinnersNotificationMessage {
    pub documents: Vec<String>,
}

impl WinnersNotificationMessage {
    pub fn new(documents: Vec<String>) -> Self {
        Self { documents }
    }

    /// Build the report for a list of winning bets.
    pub fn from_winners(winners: &[Bet]) -> Self {
        Self::new(winners.iter().map(|bet| bet.document.clone()).collect())
    }

    /// Number of winners reported.
    pub fn count(&self) -> usize {
        self.documents.len()
    }
}

impl Tagged for WinnersNotificationMessage {
    const TAG: Tag = Tag::WinnersNotification;
}

impl WireEncode for WinnersNotificationMessage {
    fn encode_into(&self, out: &mut String) {
        encode_single(Self::TAG, &self.documents.len().to_string(), out);
        out.push(FIELD_DELIMITER);
        for (i, document) in self.documents.iter().enumerate() {
            if i > 0 {
                out.push(RECORD_DELIMITER);
            }
            out.push_str(document);
        }
    }
}

impl WireDecode for WinnersNotificationMessage {
    fn decode_str(text: &str) -> Result<Self> {
        let fields = split_fields(text, Self::TAG, 2)?;
        let count: usize = parse_number(fields[0], "winner count")?;

        let documents: Vec<String> = if fields[1].is_empty() {
            Vec::new()
        } else {
            fields[1].split(RECORD_DELIMITER).map(str::to_string).collect()
        };

        if count != documents.len() {
            return Err(LotteryError::Decode(format!(
                "winner count {count} does not match {} documents",
                documents.len()
            )));
        }
        Ok(Self::new(documents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bet(agency: &str, document: &str, number: u32) -> Bet {
        Bet::new(
            agency,
            "Santiago Lionel",
            "Lorca",
            document,
            NaiveDate::from_ymd_opt(1999, 3, 17).unwrap(),
            number,
        )
    }

    fn encoded<M: WireEncode>(message: &M) -> String {
        let mut out = String::new();
        message.encode_into(&mut out);
        out
    }

    #[test]
    fn test_bet_message_exact_encoding() {
        let message = BetMessage::new(bet("1", "30904465", 7574));
        assert_eq!(
            encoded(&message),
            "BetMessage^1^Santiago Lionel^Lorca^30904465^1999-03-17^7574"
        );
    }

    #[test]
    fn test_bet_message_roundtrip() {
        let message = BetMessage::new(bet("7", "33828373", 8887));
        let decoded = BetMessage::decode(&message.encode()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_bet_message_too_few_fields() {
        let result = BetMessage::decode(b"BetMessage^1^Santiago^Lorca");
        assert!(matches!(result, Err(LotteryError::Decode(_))));
    }

    #[test]
    fn test_bet_message_too_many_fields() {
        let result = BetMessage::decode(b"BetMessage^1^a^b^30904465^1999-03-17^7574^extra");
        assert!(result.is_err());
    }

    #[test]
    fn test_bet_message_non_numeric_number() {
        let result = BetMessage::decode(b"BetMessage^1^a^b^30904465^1999-03-17^seven");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("invalid number"));
    }

    #[test]
    fn test_bet_message_invalid_birthdate() {
        let result = BetMessage::decode(b"BetMessage^1^a^b^30904465^17/03/1999^7574");
        assert!(err_contains(result, "invalid birthdate"));
    }

    #[test]
    fn test_bet_message_wrong_tag() {
        let result = BetMessage::decode(b"BetMessages^1^a^b^30904465^1999-03-17^7574");
        assert!(err_contains(result, "invalid tag"));
    }

    #[test]
    fn test_bet_message_rejects_empty_identifiers() {
        let result = BetMessage::decode(b"BetMessage^1^a^b^^1999-03-17^7574");
        assert!(matches!(result, Err(LotteryError::Decode(ref msg)) if msg.contains("document")));

        let result = BetMessage::decode(b"BetMessage^^a^b^30904465^1999-03-17^7574");
        assert!(matches!(result, Err(LotteryError::Decode(ref msg)) if msg.contains("agency")));

        // Names may be blank.
        assert!(BetMessage::decode(b"BetMessage^1^^^30904465^1999-03-17^7574").is_ok());
    }

    #[test]
    fn test_batch_with_empty_document_is_rejected() {
        let text = "BetBatchMessage~BetMessage^1^a^b^1^1999-03-17^1~BetMessage^1^a^b^^1999-03-17^1";
        assert!(matches!(
            BetBatchMessage::decode(text.as_bytes()),
            Err(LotteryError::Decode(_))
        ));
    }

    #[test]
    fn test_agency_messages_reject_empty_agency() {
        assert!(matches!(
            EndOfBetsMessage::decode(b"EndOfBetsMessage^"),
            Err(LotteryError::Decode(_))
        ));
        assert!(matches!(
            WinnersRequestMessage::decode(b"WinnersRequestMessage^"),
            Err(LotteryError::Decode(_))
        ));
    }

    #[test]
    fn test_batch_exact_encoding() {
        let message = BetBatchMessage::new(vec![bet("1", "1", 1), bet("1", "2", 2)]);
        assert_eq!(
            encoded(&message),
            "BetBatchMessage\
             ~BetMessage^1^Santiago Lionel^Lorca^1^1999-03-17^1\
             ~BetMessage^1^Santiago Lionel^Lorca^2^1999-03-17^2"
        );
    }

    #[test]
    fn test_batch_roundtrip_preserves_order() {
        let bets: Vec<Bet> = (0..5).map(|i| bet("3", &format!("{i}"), i)).collect();
        let message = BetBatchMessage::new(bets);

        let decoded = BetBatchMessage::decode(&message.encode()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_batch_requires_a_record() {
        assert!(BetBatchMessage::decode(b"BetBatchMessage").is_err());
    }

    #[test]
    fn test_batch_rejects_malformed_record() {
        let text = "BetBatchMessage~BetMessage^1^a^b^1^1999-03-17^1~BetMessage^1^a";
        assert!(BetBatchMessage::decode(text.as_bytes()).is_err());
    }

    #[test]
    fn test_end_of_bets_roundtrip() {
        let message = EndOfBetsMessage::new("A1");
        assert_eq!(encoded(&message), "EndOfBetsMessage^A1");
        assert_eq!(EndOfBetsMessage::decode(&message.encode()).unwrap(), message);
        assert!(EndOfBetsMessage::decode(b"EndOfBetsMessage").is_err());
    }

    #[test]
    fn test_ack_encoding_uses_rust_bool_text() {
        assert_eq!(encoded(&AckMessage::new(true)), "AckMessage^true");
        assert_eq!(encoded(&AckMessage::new(false)), "AckMessage^false");
    }

    #[test]
    fn test_ack_decode_accepts_capitalized_bool() {
        assert!(AckMessage::decode(b"AckMessage^True").unwrap().success);
        assert!(!AckMessage::decode(b"AckMessage^False").unwrap().success);
        assert!(AckMessage::decode(b"AckMessage^1").is_err());
    }

    #[test]
    fn test_winners_request_roundtrip() {
        let message = WinnersRequestMessage::new("2");
        assert_eq!(encoded(&message), "WinnersRequestMessage^2");
        assert_eq!(
            WinnersRequestMessage::decode(&message.encode()).unwrap(),
            message
        );
    }

    #[test]
    fn test_winners_pending() {
        assert_eq!(encoded(&WinnersPendingMessage), "WinnersPendingMessage");
        assert!(WinnersPendingMessage::decode(b"WinnersPendingMessage").is_ok());
        assert!(WinnersPendingMessage::decode(b"WinnersPendingMessage^x").is_err());
    }

    #[test]
    fn test_winners_notification_encoding() {
        let message = WinnersNotificationMessage::new(vec!["1".into(), "2".into()]);
        assert_eq!(encoded(&message), "WinnersNotificationMessage^2^1~2");
        assert_eq!(message.count(), 2);
    }

    #[test]
    fn test_winners_notification_single_document() {
        let message = WinnersNotificationMessage::new(vec!["33828373".into()]);
        assert_eq!(encoded(&message), "WinnersNotificationMessage^1^33828373");
        assert_eq!(
            WinnersNotificationMessage::decode(&message.encode()).unwrap(),
            message
        );
    }

    #[test]
    fn test_winners_notification_empty() {
        let message = WinnersNotificationMessage::default();
        assert_eq!(encoded(&message), "WinnersNotificationMessage^0^");

        let decoded = WinnersNotificationMessage::decode(&message.encode()).unwrap();
        assert_eq!(decoded.count(), 0);
    }

    #[test]
    fn test_winners_notification_count_mismatch() {
        let result = WinnersNotificationMessage::decode(b"WinnersNotificationMessage^3^1~2");
        assert!(err_contains(result, "does not match"));
    }

    #[test]
    fn test_winners_notification_bad_count() {
        let result = WinnersNotificationMessage::decode(b"WinnersNotificationMessage^x^1");
        assert!(err_contains(result, "winner count"));
    }

    #[test]
    fn test_from_winners_keeps_order() {
        let winners = vec![bet("1", "9", 1), bet("1", "3", 1)];
        let message = WinnersNotificationMessage::from_winners(&winners);
        assert_eq!(message.documents, vec!["9", "3"]);
    }

    #[test]
    fn test_matches_is_tag_exact() {
        assert!(BetMessage::matches(b"BetMessage^1"));
        assert!(!BetMessage::matches(b"BetBatchMessage~BetMessage^1"));
        assert!(BetBatchMessage::matches(b"BetBatchMessage~BetMessage^1"));
        assert!(!AckMessage::matches(&[0xC3, 0x28]));
    }

    fn err_contains<T: std::fmt::Debug>(result: Result<T>, needle: &str) -> bool {
        match result {
            Err(e) => e.to_string().contains(needle),
            Ok(v) => panic!("expected error containing {needle:?}, got {v:?}"),
        }
    }
}
