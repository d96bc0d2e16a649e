//! Reading an agency's bets from its CSV file.
//!
//! One bet per line, no header: `first,last,document,birthdate,number`.
//! The agency id is not part of the file.

use std::path::Path;

use chrono::NaiveDate;

use crate::bet::{Bet, BIRTHDATE_FORMAT};
use crate::error::{LotteryError, Result};

const COLUMNS: usize = 5;

/// Parse every non-blank line of `text` into a bet of `agency`.
///
/// # Errors
///
/// [`LotteryError::Decode`] naming the first malformed line (1-based).
pub fn parse_bets(agency: &str, text: &str) -> Result<Vec<Bet>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| parse_line(agency, line).map_err(|e| at_line(index + 1, e)))
        .collect()
}

fn parse_line(agency: &str, line: &str) -> Result<Bet> {
    let cols: Vec<&str> = line.trim_end_matches('\r').split(',').collect();
    if cols.len() != COLUMNS {
        return Err(LotteryError::Decode(format!(
            "expected {} columns, got {}",
            COLUMNS,
            cols.len()
        )));
    }

    if cols[2].is_empty() {
        return Err(LotteryError::Decode("empty document".to_string()));
    }

    let birthdate = NaiveDate::parse_from_str(cols[3], BIRTHDATE_FORMAT)
        .map_err(|e| LotteryError::Decode(format!("bad birthdate {:?}: {}", cols[3], e)))?;
    let number = cols[4]
        .parse::<u32>()
        .map_err(|e| LotteryError::Decode(format!("bad number {:?}: {}", cols[4], e)))?;

    Ok(Bet::new(agency, cols[0], cols[1], cols[2], birthdate, number))
}

fn at_line(line: usize, err: LotteryError) -> LotteryError {
    match err {
        LotteryError::Decode(msg) => LotteryError::Decode(format!("line {}: {}", line, msg)),
        other => other,
    }
}

/// Read and parse the bets file at `path`.
pub async fn load_bets(agency: &str, path: impl AsRef<Path>) -> Result<Vec<Bet>> {
    let text = tokio::fs::read_to_string(path.as_ref()).await?;
    parse_bets(agency, &text)
}
