//! In-memory bet store.

use tokio::sync::Mutex;

use super::{BetStore, BoxFuture};
use crate::bet::Bet;
use crate::error::Result;

/// Bet store keeping everything in a vector. Contents die with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bets: Mutex<Vec<Bet>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored bets.
    pub async fn len(&self) -> usize {
        self.bets.lock().await.len()
    }

    /// Check if nothing was stored yet.
    pub async fn is_empty(&self) -> bool {
        self.bets.lock().await.is_empty()
    }
}

impl BetStore for MemoryStore {
    fn append<'a>(&'a self, bets: &'a [Bet]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.bets.lock().await.extend_from_slice(bets);
            Ok(())
        })
    }

    fn load(&self) -> BoxFuture<'_, Result<Vec<Bet>>> {
        Box::pin(async move { Ok(self.bets.lock().await.clone()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_append_and_load() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await);

        let bet = Bet::new(
            "1",
            "Ana",
            "Paz",
            "10",
            NaiveDate::from_ymd_opt(2000, 1, 31).unwrap(),
            5,
        );
        store.append(std::slice::from_ref(&bet)).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.load().await.unwrap(), vec![bet]);
    }
}
