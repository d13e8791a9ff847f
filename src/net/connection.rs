//! Per-connection address information.
//!
//! # Responsibilities
//! - Capture the local (bound) and peer addresses of each accepted connection
//! - Report the connection protocol used to rebuild request URLs

use std::net::SocketAddr;

use axum::extract::connect_info::Connected;
use axum::serve::IncomingStream;
use tokio::net::TcpListener;

/// Addresses of the connection a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Address the server accepted the connection on.
    pub local: Option<SocketAddr>,
    /// Peer address of the client (or the nearest proxy).
    pub remote: SocketAddr,
    /// URL scheme of the connection.
    pub protocol: &'static str,
}

impl ConnectionInfo {
    /// Plain HTTP connection info.
    pub fn http(local: Option<SocketAddr>, remote: SocketAddr) -> Self {
        Self {
            local,
            remote,
            protocol: "http",
        }
    }

    /// Host part for URL reconstruction. `None` when the server is bound to
    /// the unspecified address and the caller must substitute a name.
    pub fn host(&self) -> Option<String> {
        self.local
            .filter(|addr| !addr.ip().is_unspecified())
            .map(|addr| addr.to_string())
    }
}

impl Connected<IncomingStream<'_, TcpListener>> for ConnectionInfo {
    fn connect_info(stream: IncomingStream<'_, TcpListener>) -> Self {
        let local = stream.io().local_addr().ok();
        Self::http(local, *stream.remote_addr())
    }
}
