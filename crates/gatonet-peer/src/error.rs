use std::time::Duration;

/// Errors that can occur in peer operations.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// The operation needs an open stream and there is none.
    #[error("no connection established")]
    NotConnected,

    /// The stream ended mid-read or a write to it failed.
    #[error("connection closed")]
    ConnectionClosed,

    /// The payload did not decode to a `{status, message}` record.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    /// The listening socket could not be created.
    #[error(transparent)]
    Bind(gatonet_transport::TransportError),

    /// The remote listener could not be reached.
    #[error(transparent)]
    Dial(gatonet_transport::TransportError),

    /// `accept` was called while an accepted peer is still connected.
    #[error("a client is already connected")]
    AlreadyConnected,

    /// The peer answered with an `ERROR` envelope.
    #[error("remote error: {0}")]
    Remote(String),

    /// A configured socket timeout expired.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] gatonet_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] gatonet_frame::FrameError),
}

impl PeerError {
    /// Whether this error means the stream is gone for good.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, PeerError::ConnectionClosed | PeerError::NotConnected)
    }
}

pub type Result<T> = std::result::Result<T, PeerError>;
