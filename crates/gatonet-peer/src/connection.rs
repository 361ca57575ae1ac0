use std::fmt;
use std::io::ErrorKind;
use std::net::SocketAddr;

use gatonet_frame::{FrameConfig, FrameError, FrameReader, FrameWriter};
use gatonet_transport::NetStream;
use tracing::{debug, info, warn};

use crate::envelope::{Envelope, Message};
use crate::error::{PeerError, Result};
use crate::status::Status;

/// One live stream carrying status-tagged envelopes.
///
/// A connection starts unconnected ([`Connection::new`]) or open (dialed or
/// accepted). It becomes unconnected again when [`close`](Connection::close)
/// runs, when the peer's `CLOSE` envelope is received, or when the stream
/// fails; it never re-opens.
///
/// `send_data` and `receive_data` form a strictly alternating conversation:
/// one side sends and waits for the reply while the other receives and then
/// responds. Nothing here enforces the turns. If both sides call `send_data`
/// at once, both block waiting for a reply that never comes.
///
/// Dropping the connection runs the close handshake.
pub struct Connection {
    channel: Option<Channel>,
    config: FrameConfig,
}

struct Channel {
    reader: FrameReader<NetStream>,
    writer: FrameWriter<NetStream>,
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
}

impl Connection {
    /// An unconnected connection. Every I/O operation fails with
    /// [`PeerError::NotConnected`].
    pub fn new() -> Self {
        Self {
            channel: None,
            config: FrameConfig::default(),
        }
    }

    /// Wrap an established stream (dialed or accepted).
    pub(crate) fn from_stream(stream: NetStream, config: FrameConfig) -> Result<Self> {
        let peer_addr = stream.peer_addr()?;
        let local_addr = stream.local_addr()?;
        let reader_stream = stream.try_clone()?;

        let reader = FrameReader::with_config_net(reader_stream, config.clone())?;
        let writer = FrameWriter::with_config_net(stream, config.clone())?;

        Ok(Self {
            channel: Some(Channel {
                reader,
                writer,
                peer_addr,
                local_addr,
            }),
            config,
        })
    }

    /// Whether a stream is currently open.
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Remote address, while open.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.channel.as_ref().map(|channel| channel.peer_addr)
    }

    /// Local address, while open.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.channel.as_ref().map(|channel| channel.local_addr)
    }

    /// Whether keep-alive probing is enabled on the stream.
    pub fn keepalive(&self) -> Result<bool> {
        let channel = self.channel.as_ref().ok_or(PeerError::NotConnected)?;
        Ok(channel.writer.get_ref().keepalive()?)
    }

    /// Frame configuration this connection was opened with.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Serialize, frame and write one envelope.
    pub fn send_envelope(&mut self, message: impl Into<Message>, status: Status) -> Result<()> {
        let channel = self.channel.as_mut().ok_or(PeerError::NotConnected)?;
        let payload = Envelope::new(message, status).to_bytes()?;

        let result = channel.writer.send(&payload);
        match result {
            Ok(()) => {
                debug!(%status, size = payload.len(), "sent envelope");
                Ok(())
            }
            Err(err) => Err(self.write_failed(err)),
        }
    }

    /// Read one frame and decode its envelope.
    pub fn receive_envelope(&mut self) -> Result<(Status, Message)> {
        let channel = self.channel.as_mut().ok_or(PeerError::NotConnected)?;

        let result = channel.reader.read_frame();
        let frame = result.map_err(|err| self.read_failed(err))?;
        let (status, message) = Envelope::parse(&frame.payload)?;

        debug!(%status, size = frame.payload.len(), "received envelope");
        Ok((status, message))
    }

    /// Acknowledge the last `ENVIO_DATOS` envelope.
    pub fn respond_success(&mut self, message: impl Into<Message>) -> Result<()> {
        self.send_envelope(message, Status::Success)
    }

    /// Reject the last `ENVIO_DATOS` envelope with an explanation.
    pub fn respond_error(&mut self, message: impl Into<Message>) -> Result<()> {
        self.send_envelope(message, Status::Error)
    }

    /// Send a payload and block until the peer replies.
    ///
    /// Returns the reply's message on `SUCCESS`. An `ERROR` reply becomes
    /// [`PeerError::Remote`] carrying the peer's message. A `CLOSE` reply
    /// means the peer hung up instead of answering: the connection is closed
    /// locally and [`PeerError::ConnectionClosed`] is returned.
    pub fn send_data(&mut self, payload: impl Into<Message>) -> Result<Message> {
        self.send_envelope(payload, Status::Data)?;

        let (status, reply) = self.receive_envelope()?;
        match status {
            Status::Success => Ok(reply),
            Status::Error => Err(PeerError::Remote(reply.to_string())),
            Status::Close => {
                debug!("peer closed instead of replying");
                self.close();
                Err(PeerError::ConnectionClosed)
            }
            Status::Data => {
                warn!("received ENVIO_DATOS while waiting for a reply; both sides sent at once");
                Ok(reply)
            }
        }
    }

    /// Wait for the peer's next payload.
    ///
    /// Returns `Ok(None)` once the peer sends `CLOSE`; the connection is
    /// closed locally before returning. An `ERROR` envelope becomes
    /// [`PeerError::Remote`].
    pub fn receive_data(&mut self) -> Result<Option<Message>> {
        let (status, message) = self.receive_envelope()?;
        match status {
            Status::Close => {
                debug!(reason = %message, "peer sent CLOSE");
                self.close();
                Ok(None)
            }
            Status::Error => Err(PeerError::Remote(message.to_string())),
            Status::Data | Status::Success => Ok(Some(message)),
        }
    }

    /// Close the connection, telling the peer first.
    ///
    /// Idempotent. Notifying the peer and shutting the socket down are both
    /// best-effort, since the peer may already be gone; the stream is
    /// released regardless.
    pub fn close(&mut self) {
        self.close_with(Message::default());
    }

    /// [`close`](Connection::close) with a message in the `CLOSE` envelope.
    pub fn close_with(&mut self, message: impl Into<Message>) {
        let Some(mut channel) = self.channel.take() else {
            return;
        };

        match Envelope::new(message, Status::Close).to_bytes() {
            Ok(payload) => {
                if let Err(err) = channel.writer.send(&payload) {
                    debug!(error = %err, "close notification not delivered");
                }
            }
            Err(err) => debug!(error = %err, "close notification not encoded"),
        }

        if let Err(err) = channel.writer.get_ref().shutdown() {
            debug!(error = %err, "socket shutdown failed");
        }

        info!(peer = %channel.peer_addr, "connection closed");
    }

    /// Drop the stream without the handshake; the peer is already gone.
    fn abort(&mut self, reason: &str) {
        if let Some(channel) = self.channel.take() {
            info!(peer = %channel.peer_addr, reason, "connection lost");
        }
    }

    fn read_failed(&mut self, err: FrameError) -> PeerError {
        match err {
            FrameError::Io(io) if is_timeout(io.kind()) => {
                PeerError::Timeout(self.config.read_timeout.unwrap_or_default())
            }
            FrameError::ConnectionClosed => {
                self.abort("eof");
                PeerError::ConnectionClosed
            }
            FrameError::Io(io) if is_disconnect(io.kind()) => {
                self.abort("reset");
                PeerError::ConnectionClosed
            }
            other => {
                self.abort("read error");
                PeerError::Frame(other)
            }
        }
    }

    fn write_failed(&mut self, err: FrameError) -> PeerError {
        match err {
            FrameError::PayloadTooLarge { .. } => PeerError::Frame(err),
            FrameError::Io(io) if is_timeout(io.kind()) => {
                // A partial frame may be on the wire; the stream is no longer usable.
                self.abort("write timeout");
                PeerError::Timeout(self.config.write_timeout.unwrap_or_default())
            }
            _ => {
                self.abort("write failed");
                PeerError::ConnectionClosed
            }
        }
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("open", &self.is_open())
            .field("peer_addr", &self.peer_addr())
            .finish()
    }
}

fn is_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
            | ErrorKind::NotConnected
    )
}
