//! Draw predicate - decides whether a stored bet wins.

use std::collections::HashSet;

use crate::bet::Bet;

/// Number drawn when nothing else is configured.
pub const DEFAULT_WINNING_NUMBER: u32 = 7574;

/// Decides win/lose for a single bet.
pub trait DrawPredicate: Send + Sync + 'static {
    fn has_won(&self, bet: &Bet) -> bool;
}

impl<F> DrawPredicate for F
where
    F: Fn(&Bet) -> bool + Send + Sync + 'static,
{
    fn has_won(&self, bet: &Bet) -> bool {
        self(bet)
    }
}

/// A bet wins when its number is one of a fixed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinningNumbers {
    numbers: HashSet<u32>,
}

impl WinningNumbers {
    pub fn new(numbers: impl IntoIterator<Item = u32>) -> Self {
        Self {
            numbers: numbers.into_iter().collect(),
        }
    }

    pub fn contains(&self, number: u32) -> bool {
        self.numbers.contains(&number)
    }
}

impl Default for WinningNumbers {
    fn default() -> Self {
        Self::new([DEFAULT_WINNING_NUMBER])
    }
}

impl DrawPredicate for WinningNumbers {
    fn has_won(&self, bet: &Bet) -> bool {
        self.contains(bet.number)
    }
}
