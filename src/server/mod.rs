//! Server module - accept loop and per-connection sessions.
//!
//! ```text
//! TcpListener ──accept──► permit? ──yes──► spawn(serve_connection)
//!                            │
//!                            └──no───► drop connection (warn)
//! ```
//!
//! Each connection gets its own task and shares one [`RequestRouter`].
//! The number of live sessions is capped with a semaphore.

mod session;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;

pub use session::serve_connection;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::handler::{RequestContext, RequestRouter};
use crate::protocol::DEFAULT_MAX_FRAME_SIZE;
use crate::transport::bind_listener;

/// Default cap on concurrently served connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 256;

/// Pause after a failed accept before the listener is polled again.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accepts agency connections and hands them to the router.
pub struct Server {
    listener: TcpListener,
    router: RequestRouter,
    max_connections: usize,
    max_frame_size: u32,
}

impl Server {
    /// Bind on `0.0.0.0:<port>` using the limits from `config`.
    pub fn bind(config: &ServerConfig, router: RequestRouter) -> Result<Self> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = bind_listener(addr, config.listen_backlog)?;
        Ok(Self::from_listener(listener, router)
            .max_connections(config.max_connections)
            .max_frame_size(config.max_frame_size))
    }

    /// Serve on an already bound listener with default limits.
    pub fn from_listener(listener: TcpListener, router: RequestRouter) -> Self {
        Self {
            listener,
            router,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Set the maximum number of concurrently served connections.
    ///
    /// Connections accepted past this limit are closed immediately.
    pub fn max_connections(mut self, limit: usize) -> Self {
        self.max_connections = limit;
        self
    }

    /// Set the largest payload a peer may announce.
    pub fn max_frame_size(mut self, limit: u32) -> Self {
        self.max_frame_size = limit;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` completes.
    ///
    /// Sessions already running are not waited for; they end with the
    /// runtime.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let semaphore = Arc::new(Semaphore::new(self.max_connections));
        let router = Arc::new(self.router);
        let mut next_session = 0u64;

        tracing::info!(
            addr = %self.listener.local_addr()?,
            max_connections = self.max_connections,
            "Server listening"
        );

        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, no longer accepting connections");
                    return Ok(());
                }
                accepted = accept_next(|| self.listener.accept(), ACCEPT_BACKOFF) => accepted,
            };

            next_session += 1;
            let ctx = RequestContext::with_peer(next_session, peer);

            let permit = match semaphore.clone().try_acquire_owned() {
                Ok(p) => p,
                Err(_) => {
                    tracing::warn!(
                        session = next_session,
                        %peer,
                        "Connection limit reached, dropping connection"
                    );
                    continue;
                }
            };

            tracing::debug!(session = next_session, %peer, "Connection accepted");

            let router = router.clone();
            let max_frame_size = self.max_frame_size;
            tokio::spawn(async move {
                // Permit is held until the session ends
                let _permit = permit;

                if let Err(e) = serve_connection(stream, &router, ctx, max_frame_size).await {
                    tracing::warn!(session = ctx.session_id(), %peer, error = %e, "Session closed");
                }
            });
        }
    }
}

/// Next accepted connection. Failed accepts (fd exhaustion, aborted
/// handshakes) are logged and retried after `backoff`.
async fn accept_next<T, F, Fut>(mut accept: F, backoff: Duration) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(e) => {
                tracing::warn!(error = %e, backoff_ms = backoff.as_millis() as u64, "Accept failed");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
