//! Barrier-and-broadcast coordinator for the lottery draw.
//!
//! ```text
//!  store_bets ──┐
//!  store_bets ──┼─► Mutex<State> ──(last agency)──► draw ──► watch: ready = true
//!  mark_end  ───┘                                              │
//!                                    get_winners ◄─────────────┘ (any number, any time)
//! ```
//!
//! All state transitions happen under a single async lock, so the check
//! "threshold reached and not drawn yet" and the move to `Drawing` are one
//! atomic step: one caller runs the draw and at most one draw succeeds.
//! Waiters never hold the lock; they watch the readiness channel, which also answers callers
//! that arrive after the draw.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};

use super::state::{partition_winners, MarkOutcome, Phase, State};
use crate::bet::Bet;
use crate::draw::DrawPredicate;
use crate::error::{LotteryError, Result};
use crate::store::BetStore;

/// Store scans tried per draw before the draw is reported as failed.
pub const DEFAULT_DRAW_ATTEMPTS: u32 = 3;

/// Pause between two store scans of the same draw.
pub const DEFAULT_DRAW_BACKOFF: Duration = Duration::from_millis(100);

/// Owns the draw state shared by every connection.
///
/// Construct one per process (or per test) and share it behind an `Arc`.
pub struct BetCoordinator {
    total_agencies: usize,
    store: Arc<dyn BetStore>,
    predicate: Arc<dyn DrawPredicate>,
    state: Mutex<State>,
    ready: watch::Sender<bool>,
    draw_attempts: u32,
    draw_backoff: Duration,
}

impl BetCoordinator {
    /// Create a coordinator expecting `total_agencies` completion signals.
    ///
    /// # Errors
    ///
    /// [`LotteryError::Config`] if `total_agencies` is zero.
    pub fn new(
        total_agencies: usize,
        store: Arc<dyn BetStore>,
        predicate: Arc<dyn DrawPredicate>,
    ) -> Result<Self> {
        if total_agencies == 0 {
            return Err(LotteryError::Config(
                "total_agencies must be greater than zero".to_string(),
            ));
        }

        let (ready, _) = watch::channel(false);
        Ok(Self {
            total_agencies,
            store,
            predicate,
            state: Mutex::new(State::new()),
            ready,
            draw_attempts: DEFAULT_DRAW_ATTEMPTS,
            draw_backoff: DEFAULT_DRAW_BACKOFF,
        })
    }

    /// Set how many store scans one draw tries, and the pause between them.
    ///
    /// Zero attempts is treated as one.
    pub fn draw_retry(mut self, attempts: u32, backoff: Duration) -> Self {
        self.draw_attempts = attempts.max(1);
        self.draw_backoff = backoff;
        self
    }

    /// Number of agencies the draw waits for.
    pub fn total_agencies(&self) -> usize {
        self.total_agencies
    }

    /// Current phase.
    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase
    }

    /// Number of agencies that signaled completion so far.
    pub async fn completed_agencies(&self) -> usize {
        self.state.lock().await.completed.len()
    }

    /// Whether the draw has been computed. Does not take the lock.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Persist `bets` as one unit.
    ///
    /// Runs inside the critical section so batches from different agencies
    /// never interleave.
    pub async fn store_bets(&self, bets: &[Bet]) -> Result<()> {
        let _state = self.state.lock().await;
        self.store.append(bets).await
    }

    /// Record that `agency` will send no more bets.
    ///
    /// The call that brings the completed set to `total_agencies` runs the
    /// draw and wakes every waiter before returning. A failing store scan is
    /// retried up to the configured number of attempts; if all of them fail
    /// the coordinator goes back to `Collecting` and the next completion
    /// signal starts a new draw.
    pub async fn mark_end_of_bets(&self, agency: &str) -> Result<MarkOutcome> {
        let mut state = self.state.lock().await;

        if !state.completed.insert(agency.to_string()) {
            tracing::debug!(agency, "Repeated completion signal");
        }

        if state.phase == Phase::Ready {
            return Ok(MarkOutcome::AlreadyDrawn);
        }

        let completed = state.completed.len();
        if completed < self.total_agencies {
            tracing::info!(
                action = "end_of_bets",
                agency,
                completed,
                total = self.total_agencies,
                "Waiting for remaining agencies"
            );
            return Ok(MarkOutcome::Waiting {
                completed,
                total: self.total_agencies,
            });
        }

        state.phase = Phase::Drawing;
        tracing::info!(action = "draw", result = "in_progress", triggered_by = agency);

        match self.compute_winners().await {
            Ok(winners) => {
                let count = winners.values().map(Vec::len).sum();
                state.winners = winners;
                state.phase = Phase::Ready;
                self.ready.send_replace(true);
                tracing::info!(action = "draw", result = "success", winners = count);
                Ok(MarkOutcome::Drew { winners: count })
            }
            Err(e) => {
                state.phase = Phase::Collecting;
                tracing::error!(action = "draw", result = "fail", error = %e);
                Err(e)
            }
        }
    }

    /// Full store scan partitioned by agency, retried on store errors.
    ///
    /// Runs with the state lock held, so nothing is appended in between.
    async fn compute_winners(&self) -> Result<HashMap<String, Vec<Bet>>> {
        let mut attempt = 1;
        loop {
            match self.store.load().await {
                Ok(bets) => {
                    return Ok(partition_winners(&bets, |bet| self.predicate.has_won(bet)));
                }
                Err(e) if attempt < self.draw_attempts => {
                    tracing::warn!(
                        action = "draw",
                        result = "retry",
                        attempt,
                        attempts = self.draw_attempts,
                        error = %e
                    );
                    attempt += 1;
                    tokio::time::sleep(self.draw_backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Wait until the draw is available, giving up after `deadline`.
    ///
    /// # Errors
    ///
    /// [`LotteryError::DeadlineExceeded`] if the draw did not happen in time.
    pub async fn wait_until_ready(&self, deadline: Duration) -> Result<()> {
        let mut ready = self.ready.subscribe();
        let waited = tokio::time::timeout(deadline, async move {
            ready.wait_for(|is_ready| *is_ready).await.map(|_| ())
        })
        .await;

        match waited {
            Ok(Ok(())) => Ok(()),
            // The sender lives as long as `self`.
            Ok(Err(_)) => Err(LotteryError::Protocol(
                "readiness channel closed".to_string(),
            )),
            Err(_) => Err(LotteryError::DeadlineExceeded),
        }
    }

    /// Winners of `agency`, waiting for the draw for at most `deadline`.
    ///
    /// Returns immediately once the draw exists; repeated calls return the
    /// same list.
    pub async fn get_winners(&self, agency: &str, deadline: Duration) -> Result<Vec<Bet>> {
        self.wait_until_ready(deadline).await?;
        Ok(self.state.lock().await.winners_of(agency))
    }

    /// Winners of `agency` if the draw already happened, `None` otherwise.
    pub async fn try_winners(&self, agency: &str) -> Option<Vec<Bet>> {
        let state = self.state.lock().await;
        (state.phase == Phase::Ready).then(|| state.winners_of(agency))
    }
}

impl std::fmt::Debug for BetCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BetCoordinator")
            .field("total_agencies", &self.total_agencies)
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::WinningNumbers;
    use crate::store::{BoxFuture, MemoryStore};
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WAIT: Duration = Duration::from_secs(5);

    fn bet(agency: &str, document: &str, number: u32) -> Bet {
        Bet::new(
            agency,
            "Ana",
            "Paz",
            document,
            NaiveDate::from_ymd_opt(2000, 1, 31).unwrap(),
            number,
        )
    }

    /// Memory store counting full scans; the draw is the only scanner.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        loads: AtomicUsize,
        failing_loads: AtomicUsize,
    }

    impl CountingStore {
        fn failing_first(n: usize) -> Self {
            let store = Self::default();
            store.failing_loads.store(n, Ordering::SeqCst);
            store
        }
    }

    impl BetStore for CountingStore {
        fn append<'a>(&'a self, bets: &'a [Bet]) -> BoxFuture<'a, Result<()>> {
            self.inner.append(bets)
        }

        fn load(&self) -> BoxFuture<'_, Result<Vec<Bet>>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let fail = self
                .failing_loads
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if fail {
                return Box::pin(async { Err(LotteryError::Store("disk on fire".to_string())) });
            }
            self.inner.load()
        }
    }

    fn coordinator(total: usize, store: Arc<CountingStore>) -> BetCoordinator {
        BetCoordinator::new(total, store, Arc::new(WinningNumbers::new([8887]))).unwrap()
    }

    #[test]
    fn test_zero_agencies_rejected() {
        let result = BetCoordinator::new(
            0,
            Arc::new(MemoryStore::new()),
            Arc::new(WinningNumbers::default()),
        );
        assert!(matches!(result, Err(LotteryError::Config(_))));
    }

    #[tokio::test]
    async fn test_waiting_below_threshold() {
        let coordinator = coordinator(3, Arc::new(CountingStore::default()));

        let outcome = coordinator.mark_end_of_bets("1").await.unwrap();

        assert_eq!(outcome, MarkOutcome::Waiting { completed: 1, total: 3 });
        assert_eq!(coordinator.phase().await, Phase::Collecting);
        assert!(coordinator.try_winners("1").await.is_none());
        assert!(!coordinator.is_ready());
    }

    #[tokio::test]
    async fn test_repeated_signal_counts_once() {
        let coordinator = coordinator(2, Arc::new(CountingStore::default()));

        coordinator.mark_end_of_bets("1").await.unwrap();
        let outcome = coordinator.mark_end_of_bets("1").await.unwrap();

        assert_eq!(outcome, MarkOutcome::Waiting { completed: 1, total: 2 });
        assert_eq!(coordinator.completed_agencies().await, 1);
    }

    #[tokio::test]
    async fn test_last_agency_runs_draw() {
        let store = Arc::new(CountingStore::default());
        let coordinator = coordinator(2, store.clone());

        coordinator
            .store_bets(&[bet("1", "33828373", 8887), bet("1", "1", 1)])
            .await
            .unwrap();
        coordinator.mark_end_of_bets("1").await.unwrap();
        let outcome = coordinator.mark_end_of_bets("2").await.unwrap();

        assert_eq!(outcome, MarkOutcome::Drew { winners: 1 });
        assert_eq!(coordinator.phase().await, Phase::Ready);
        assert!(coordinator.is_ready());

        let winners = coordinator.get_winners("1", WAIT).await.unwrap();
        assert_eq!(winners, vec![bet("1", "33828373", 8887)]);
        assert!(coordinator.get_winners("2", WAIT).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_signal_after_draw_changes_nothing() {
        let store = Arc::new(CountingStore::default());
        let coordinator = coordinator(1, store.clone());

        coordinator.mark_end_of_bets("1").await.unwrap();
        let outcome = coordinator.mark_end_of_bets("9").await.unwrap();

        assert_eq!(outcome, MarkOutcome::AlreadyDrawn);
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_completion_draws_exactly_once() {
        const AGENCIES: usize = 16;
        let store = Arc::new(CountingStore::default());
        let coordinator = Arc::new(coordinator(AGENCIES, store.clone()));

        for i in 0..AGENCIES {
            coordinator
                .store_bets(&[bet(&i.to_string(), &format!("doc-{i}"), 8887)])
                .await
                .unwrap();
        }

        let handles: Vec<_> = (0..AGENCIES)
            .map(|i| {
                let coordinator = coordinator.clone();
                tokio::spawn(async move {
                    let agency = i.to_string();
                    let outcome = coordinator.mark_end_of_bets(&agency).await.unwrap();
                    let winners = coordinator.get_winners(&agency, WAIT).await.unwrap();
                    (outcome, winners)
                })
            })
            .collect();

        let mut draws = 0;
        for (i, handle) in handles.into_iter().enumerate() {
            let (outcome, winners) = handle.await.unwrap();
            if matches!(outcome, MarkOutcome::Drew { .. }) {
                draws += 1;
            }
            assert_eq!(winners.len(), 1);
            assert_eq!(winners[0].document, format!("doc-{i}"));
        }

        assert_eq!(draws, 1);
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_waiter_released_by_later_draw() {
        let coordinator = Arc::new(coordinator(2, Arc::new(CountingStore::default())));
        coordinator.store_bets(&[bet("1", "10", 8887)]).await.unwrap();
        coordinator.mark_end_of_bets("1").await.unwrap();

        let waiter = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.get_winners("1", WAIT).await })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        coordinator.mark_end_of_bets("2").await.unwrap();
        let winners = waiter.await.unwrap().unwrap();
        assert_eq!(winners.len(), 1);
    }

    #[tokio::test]
    async fn test_get_winners_is_idempotent() {
        let store = Arc::new(CountingStore::default());
        let coordinator = coordinator(1, store.clone());
        coordinator.store_bets(&[bet("1", "10", 8887)]).await.unwrap();
        coordinator.mark_end_of_bets("1").await.unwrap();

        let first = coordinator.get_winners("1", WAIT).await.unwrap();
        let second = coordinator.get_winners("1", WAIT).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_deadline_exceeded() {
        let coordinator = coordinator(2, Arc::new(CountingStore::default()));
        coordinator.mark_end_of_bets("1").await.unwrap();

        let result = coordinator.get_winners("1", Duration::from_secs(30)).await;

        assert!(matches!(result, Err(LotteryError::DeadlineExceeded)));
        assert_eq!(coordinator.phase().await, Phase::Collecting);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_scan_failure_is_retried_within_the_draw() {
        let store = Arc::new(CountingStore::failing_first(1));
        let coordinator = coordinator(1, store.clone());

        let outcome = coordinator.mark_end_of_bets("1").await.unwrap();

        assert_eq!(outcome, MarkOutcome::Drew { winners: 0 });
        assert!(coordinator.is_ready());
        assert_eq!(store.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_draw_reverts_and_is_retried() {
        let store = Arc::new(CountingStore::failing_first(DEFAULT_DRAW_ATTEMPTS as usize));
        let coordinator = coordinator(1, store.clone());

        let first = coordinator.mark_end_of_bets("1").await;
        assert!(matches!(first, Err(LotteryError::Store(_))));
        assert_eq!(coordinator.phase().await, Phase::Collecting);
        assert!(!coordinator.is_ready());
        assert_eq!(
            store.loads.load(Ordering::SeqCst),
            DEFAULT_DRAW_ATTEMPTS as usize
        );

        let retry = coordinator.mark_end_of_bets("1").await.unwrap();
        assert_eq!(retry, MarkOutcome::Drew { winners: 0 });
    }

    #[tokio::test]
    async fn test_single_attempt_draw() {
        let store = Arc::new(CountingStore::failing_first(1));
        let coordinator = coordinator(1, store.clone()).draw_retry(0, Duration::ZERO);

        assert!(coordinator.mark_end_of_bets("1").await.is_err());
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_separate_instances_do_not_share_state() {
        let a = coordinator(1, Arc::new(CountingStore::default()));
        let b = coordinator(1, Arc::new(CountingStore::default()));

        a.mark_end_of_bets("1").await.unwrap();

        assert!(a.is_ready());
        assert!(!b.is_ready());
        assert_eq!(b.completed_agencies().await, 0);
    }
}
