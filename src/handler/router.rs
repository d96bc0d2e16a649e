//! Request router: one decoded request in, at most one response out.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use super::RequestContext;
use crate::bet::Bet;
use crate::codec::{
    AckMessage, Request, Response, WinnersNotificationMessage, WinnersPendingMessage,
};
use crate::config::WinnersMode;
use crate::coordinator::BetCoordinator;
use crate::error::Result;

/// Default bound on a barrier-mode wait for the draw.
pub const DEFAULT_WINNERS_TIMEOUT: Duration = Duration::from_secs(300);

/// Dispatches decoded requests to the coordinator.
///
/// Shared by every session; holds no per-connection state.
#[derive(Debug, Clone)]
pub struct RequestRouter {
    coordinator: Arc<BetCoordinator>,
    mode: WinnersMode,
    winners_timeout: Duration,
}

impl RequestRouter {
    /// Router in barrier mode with the default wait bound.
    pub fn new(coordinator: Arc<BetCoordinator>) -> Self {
        Self {
            coordinator,
            mode: WinnersMode::default(),
            winners_timeout: DEFAULT_WINNERS_TIMEOUT,
        }
    }

    /// Select how `EndOfBetsMessage` is answered.
    pub fn winners_mode(mut self, mode: WinnersMode) -> Self {
        self.mode = mode;
        self
    }

    /// Bound a barrier-mode wait for the draw.
    pub fn winners_timeout(mut self, timeout: Duration) -> Self {
        self.winners_timeout = timeout;
        self
    }

    pub fn coordinator(&self) -> &Arc<BetCoordinator> {
        &self.coordinator
    }

    /// Decode `payload`, dispatch it and encode the reply.
    ///
    /// # Errors
    ///
    /// Decode and unknown-tag errors, plus coordinator errors that leave no
    /// meaningful reply (draw failure, deadline). The caller closes the
    /// connection on any error.
    pub async fn handle(&self, payload: &[u8], ctx: RequestContext) -> Result<Option<Bytes>> {
        let request = Request::decode(payload)?;
        let response = self.dispatch(request, ctx).await?;
        Ok(response.map(|r| r.encode()))
    }

    /// Run the handler for an already decoded request.
    pub async fn dispatch(&self, request: Request, ctx: RequestContext) -> Result<Option<Response>> {
        match request {
            Request::Bet(message) => {
                let bets = std::slice::from_ref(&message.bet);
                Ok(Some(self.store(bets, ctx).await))
            }
            Request::BetBatch(message) => Ok(Some(self.store(&message.bets, ctx).await)),
            Request::EndOfBets(message) => self.end_of_bets(&message.agency, ctx).await,
            Request::WinnersQuery(message) => Ok(Some(self.winners_query(&message.agency).await)),
        }
    }

    /// Store failures are answered in-band.
    async fn store(&self, bets: &[Bet], ctx: RequestContext) -> Response {
        let agency = bets.first().map(|b| b.agency.as_str()).unwrap_or_default();
        match self.coordinator.store_bets(bets).await {
            Ok(()) => {
                tracing::info!(
                    action = "store_bets",
                    result = "success",
                    session = ctx.session_id(),
                    agency,
                    count = bets.len()
                );
                Response::Ack(AckMessage::new(true))
            }
            Err(e) => {
                tracing::error!(
                    action = "store_bets",
                    result = "fail",
                    session = ctx.session_id(),
                    agency,
                    count = bets.len(),
                    error = %e
                );
                Response::Ack(AckMessage::new(false))
            }
        }
    }

    async fn end_of_bets(&self, agency: &str, ctx: RequestContext) -> Result<Option<Response>> {
        let outcome = self.coordinator.mark_end_of_bets(agency).await?;
        tracing::debug!(session = ctx.session_id(), agency, ?outcome, "End of bets");

        match self.mode {
            WinnersMode::Polling => Ok(None),
            WinnersMode::Barrier => {
                let winners = self
                    .coordinator
                    .get_winners(agency, self.winners_timeout)
                    .await?;
                Ok(Some(report(agency, &winners)))
            }
        }
    }

    async fn winners_query(&self, agency: &str) -> Response {
        match self.coordinator.try_winners(agency).await {
            Some(winners) => report(agency, &winners),
            None => Response::WinnersPending(WinnersPendingMessage),
        }
    }
}

fn report(agency: &str, winners: &[Bet]) -> Response {
    tracing::info!(
        action = "winners_report",
        result = "success",
        agency,
        winners = winners.len()
    );
    Response::WinnersReport(WinnersNotificationMessage::from_winners(winners))
}
