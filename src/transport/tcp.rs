//! TCP listener and connector.
//!
//! # Example
//!
//! ```ignore
//! use lottery_coordinator::transport::{bind_listener, connect};
//!
//! let listener = bind_listener("0.0.0.0:12345".parse()?, 128)?;
//! let stream = connect("server:12345").await?;
//! ```

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpSocket, TcpStream};

use crate::error::Result;

/// Bind a listening socket on `addr` with an explicit accept backlog.
///
/// `SO_REUSEADDR` is set on Unix so a restarted server can rebind while old
/// connections sit in `TIME_WAIT`.
pub fn bind_listener(addr: SocketAddr, backlog: u32) -> Result<TcpListener> {
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };

    #[cfg(unix)]
    socket.set_reuseaddr(true)?;

    socket.bind(addr)?;
    let listener = socket.listen(backlog)?;

    tracing::debug!(%addr, backlog, "Listener bound");
    Ok(listener)
}

/// Open a connection to `addr` (`host:port`, resolved by tokio).
pub async fn connect(addr: &str) -> Result<TcpStream> {
    let stream = TcpStream::connect(addr).await?;
    // Messages are small and each one waits for a reply.
    stream.set_nodelay(true)?;
    Ok(stream)
}
