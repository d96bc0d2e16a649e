//! Per-connection context handed to the router.

use std::net::SocketAddr;

/// Identifies the connection a request arrived on.
///
/// Cheap to copy; used for log fields only, the router keeps no
/// per-connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    /// Sequential id assigned by the accept loop.
    session_id: u64,
    /// Remote address, if the transport has one.
    peer: Option<SocketAddr>,
}

impl RequestContext {
    /// Context without a peer address (tests, in-memory streams).
    pub const fn new(session_id: u64) -> Self {
        Self {
            session_id,
            peer: None,
        }
    }

    /// Context for a TCP connection.
    pub const fn with_peer(session_id: u64, peer: SocketAddr) -> Self {
        Self {
            session_id,
            peer: Some(peer),
        }
    }

    #[inline]
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    #[inline]
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_is_optional() {
        assert_eq!(RequestContext::new(3).peer(), None);

        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let ctx = RequestContext::with_peer(7, addr);
        assert_eq!(ctx.session_id(), 7);
        assert_eq!(ctx.peer(), Some(addr));
    }
}
