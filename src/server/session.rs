//! One connection: read a frame, route it, write the reply, repeat.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{LotteryError, Result};
use crate::handler::{RequestContext, RequestRouter};
use crate::protocol::{read_message, write_message};

/// Serve requests on `stream` until the peer closes it.
///
/// Returns `Ok(())` when the peer hangs up. Any other error ends the
/// session; coordinator state is left as it was.
pub async fn serve_connection<S>(
    mut stream: S,
    router: &RequestRouter,
    ctx: RequestContext,
    max_frame_size: u32,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut served = 0u64;

    loop {
        let payload = match read_message(&mut stream, max_frame_size).await {
            Ok(payload) => payload,
            Err(LotteryError::ConnectionClosed) => {
                tracing::debug!(session = ctx.session_id(), served, "Peer closed connection");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if let Some(reply) = router.handle(&payload, ctx).await? {
            write_message(&mut stream, &reply).await?;
        }
        served += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::bet::Bet;
    use crate::codec::{AckMessage, BetMessage, Response, WireEncode};
    use crate::coordinator::BetCoordinator;
    use crate::draw::WinningNumbers;
    use crate::protocol::DEFAULT_MAX_FRAME_SIZE;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use tokio::io::AsyncWriteExt;

    fn router() -> RequestRouter {
        let coordinator = BetCoordinator::new(
            1,
            Arc::new(MemoryStore::new()),
            Arc::new(WinningNumbers::default()),
        )
        .unwrap();
        RequestRouter::new(Arc::new(coordinator))
    }

    #[tokio::test]
    async fn test_requests_are_answered_until_close() {
        let router = router();
        let (server_side, mut client) = tokio::io::duplex(1024);

        let session = tokio::spawn(async move {
            serve_connection(server_side, &router, RequestContext::new(1), DEFAULT_MAX_FRAME_SIZE)
                .await
        });

        let bet = Bet::new(
            "1",
            "Ana",
            "Paz",
            "10",
            NaiveDate::from_ymd_opt(2000, 1, 31).unwrap(),
            5,
        );
        for _ in 0..2 {
            write_message(&mut client, &BetMessage::new(bet.clone()).encode())
                .await
                .unwrap();
            let reply = read_message(&mut client, DEFAULT_MAX_FRAME_SIZE).await.unwrap();
            assert_eq!(
                Response::decode(&reply).unwrap(),
                Response::Ack(AckMessage::new(true))
            );
        }

        drop(client);
        assert!(session.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_unknown_message_ends_session() {
        let router = router();
        let (server_side, mut client) = tokio::io::duplex(1024);

        let session = tokio::spawn(async move {
            serve_connection(server_side, &router, RequestContext::new(2), DEFAULT_MAX_FRAME_SIZE)
                .await
        });

        write_message(&mut client, b"GarbageMessage^1").await.unwrap();

        let result = session.await.unwrap();
        assert!(matches!(result, Err(LotteryError::UnknownMessage(_))));
    }

    #[tokio::test]
    async fn test_oversized_frame_ends_session() {
        let router = router();
        let (server_side, mut client) = tokio::io::duplex(1024);

        let session = tokio::spawn(async move {
            serve_connection(server_side, &router, RequestContext::new(3), 16).await
        });

        client.write_all(&1024u32.to_be_bytes()).await.unwrap();

        let result = session.await.unwrap();
        assert!(matches!(
            result,
            Err(LotteryError::FrameTooLarge { len: 1024, max: 16 })
        ));
    }
}
