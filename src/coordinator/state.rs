//! Shared state guarded by the coordinator lock.

use std::collections::{HashMap, HashSet};

use crate::bet::Bet;

/// Lifecycle of the draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting bets and completion signals.
    Collecting,
    /// The threshold was reached and one caller is computing winners.
    Drawing,
    /// Winners are available. Terminal.
    Ready,
}

/// What a completion signal caused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// Recorded; still waiting for other agencies.
    Waiting { completed: usize, total: usize },
    /// This call reached the threshold and ran the draw.
    Drew { winners: usize },
    /// The draw had already run; nothing changed.
    AlreadyDrawn,
}

/// Everything that must change together.
#[derive(Debug)]
pub(super) struct State {
    pub phase: Phase,
    /// Agencies that signaled completion. Only grows.
    pub completed: HashSet<String>,
    /// Winning bets per agency, filled once when entering `Ready`.
    pub winners: HashMap<String, Vec<Bet>>,
}

impl State {
    pub fn new() -> Self {
        Self {
            phase: Phase::Collecting,
            completed: HashSet::new(),
            winners: HashMap::new(),
        }
    }

    /// Winners of `agency`, empty if it has none.
    pub fn winners_of(&self, agency: &str) -> Vec<Bet> {
        self.winners.get(agency).cloned().unwrap_or_default()
    }
}

/// Group winning bets by agency, keeping scan order within each agency.
pub(super) fn partition_winners<'a>(
    bets: impl IntoIterator<Item = &'a Bet>,
    mut has_won: impl FnMut(&Bet) -> bool,
) -> HashMap<String, Vec<Bet>> {
    let mut winners: HashMap<String, Vec<Bet>> = HashMap::new();
    for bet in bets {
        if has_won(bet) {
            winners.entry(bet.agency.clone()).or_default().push(bet.clone());
        }
    }
    winners
}
