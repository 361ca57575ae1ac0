use std::net::SocketAddr;

use gatonet_frame::FrameConfig;
use gatonet_transport::{TcpSocket, TransportError};
use tracing::info;

use crate::connection::Connection;
use crate::error::{PeerError, Result};

/// Message carried in the `CLOSE` envelope when the server hangs up.
const SERVER_CLOSING: &str = "Server closing";

/// Server side: accepts one peer at a time.
///
/// The accepted [`Connection`] stays owned by the listener; borrow it with
/// [`connection`](Listener::connection). Serving one peer at a time is a
/// deliberate limitation: [`accept`](Listener::accept) refuses to run while
/// the current peer is still connected.
pub struct Listener {
    socket: Option<TcpSocket>,
    local_addr: SocketAddr,
    connection: Option<Connection>,
    frame_config: FrameConfig,
}

impl Listener {
    /// Bind and listen on `host:port` with a backlog of one.
    pub fn bind(host: &str, port: u16) -> Result<Self> {
        Self::bind_with_config(host, port, FrameConfig::default())
    }

    /// Bind with an explicit frame configuration for accepted connections.
    pub fn bind_with_config(host: &str, port: u16, frame_config: FrameConfig) -> Result<Self> {
        let socket = TcpSocket::bind(host, port).map_err(PeerError::Bind)?;
        let local_addr = socket.local_addr();
        Ok(Self {
            socket: Some(socket),
            local_addr,
            connection: None,
            frame_config,
        })
    }

    /// Block until a peer connects; returns its address.
    ///
    /// Fails with [`PeerError::AlreadyConnected`] while the previously
    /// accepted peer is still connected. Keep-alive probing is enabled on the
    /// accepted stream so a peer that vanishes without closing is eventually
    /// detected.
    pub fn accept(&mut self) -> Result<SocketAddr> {
        if self.has_connection() {
            return Err(PeerError::AlreadyConnected);
        }
        let socket = self
            .socket
            .as_ref()
            .ok_or(PeerError::Transport(TransportError::Shutdown))?;

        let (stream, addr) = socket.accept()?;
        stream.set_keepalive(true)?;

        self.connection = Some(Connection::from_stream(
            stream,
            self.frame_config.clone(),
        )?);
        info!(%addr, "connection established");
        Ok(addr)
    }

    /// Whether an accepted peer is currently connected.
    pub fn has_connection(&self) -> bool {
        self.connection.as_ref().is_some_and(Connection::is_open)
    }

    /// Borrow the accepted connection.
    ///
    /// Fails with [`PeerError::NotConnected`] if no peer is connected.
    pub fn connection(&mut self) -> Result<&mut Connection> {
        self.connection
            .as_mut()
            .filter(|conn| conn.is_open())
            .ok_or(PeerError::NotConnected)
    }

    /// Close only the accepted peer, keeping the listening socket.
    ///
    /// Idempotent. A new peer can be accepted afterwards.
    pub fn close_connection(&mut self) {
        if let Some(mut conn) = self.connection.take() {
            conn.close_with(SERVER_CLOSING);
        }
    }

    /// Close the accepted peer (with handshake), then the listening socket.
    ///
    /// Idempotent.
    pub fn close(&mut self) {
        self.close_connection();
        if self.socket.take().is_some() {
            info!(addr = %self.local_addr, "listening socket closed");
        }
    }

    /// Whether the listening socket is still open.
    pub fn is_listening(&self) -> bool {
        self.socket.is_some()
    }

    /// The address the listening socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("local_addr", &self.local_addr)
            .field("listening", &self.is_listening())
            .field("connection", &self.connection)
            .finish()
    }
}
