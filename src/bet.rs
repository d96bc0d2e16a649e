//! The bet record shared by the codec, the store and the coordinator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Format of birth dates on the wire and in client CSV files.
pub const BIRTHDATE_FORMAT: &str = "%Y-%m-%d";

/// A single bet placed at an agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    /// Agency that collected the bet.
    pub agency: String,
    pub first_name: String,
    pub last_name: String,
    /// National document number of the gambler.
    pub document: String,
    pub birthdate: NaiveDate,
    /// Number the gambler bet on.
    pub number: u32,
}

impl Bet {
    /// Create a new bet.
    pub fn new(
        agency: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        document: impl Into<String>,
        birthdate: NaiveDate,
        number: u32,
    ) -> Self {
        Self {
            agency: agency.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            document: document.into(),
            birthdate,
            number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_layout() {
        let bet = Bet::new(
            "1",
            "Santiago",
            "Lorca",
            "30904465",
            NaiveDate::from_ymd_opt(1999, 3, 17).unwrap(),
            7574,
        );

        let json = serde_json::to_value(&bet).unwrap();
        assert_eq!(json["agency"], "1");
        assert_eq!(json["birthdate"], "1999-03-17");
        assert_eq!(json["number"], 7574);

        let back: Bet = serde_json::from_value(json).unwrap();
        assert_eq!(back, bet);
    }
}
