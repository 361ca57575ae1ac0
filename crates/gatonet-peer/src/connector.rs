use std::time::Duration;

use gatonet_frame::FrameConfig;
use gatonet_transport::TcpSocket;
use tracing::info;

use crate::connection::Connection;
use crate::error::{PeerError, Result};

/// Client-side connection settings.
#[derive(Debug, Clone, Default)]
pub struct DialConfig {
    /// Upper bound on each connect attempt. `None` leaves it to the OS.
    pub connect_timeout: Option<Duration>,
    /// Frame configuration for the resulting connection.
    pub frame: FrameConfig,
}

/// Connect to a listening peer as a client.
pub fn dial(host: &str, port: u16) -> Result<Connection> {
    dial_with_config(host, port, &DialConfig::default())
}

/// Connect with explicit configuration.
///
/// Refused, timed-out, unreachable and unresolvable addresses all fail with
/// [`PeerError::Dial`].
pub fn dial_with_config(host: &str, port: u16, config: &DialConfig) -> Result<Connection> {
    let stream = match config.connect_timeout {
        Some(timeout) => TcpSocket::connect_timeout(host, port, timeout),
        None => TcpSocket::connect(host, port),
    }
    .map_err(PeerError::Dial)?;

    let conn = Connection::from_stream(stream, config.frame.clone())?;
    info!(host, port, peer = ?conn.peer_addr(), "connected to server");
    Ok(conn)
}
