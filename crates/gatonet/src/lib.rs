//! Framed, status-tagged messaging over TCP.
//!
//! gatonet connects the two players of a tic-tac-toe (or Ultimate
//! Tic-Tac-Toe) match. Each message is a `{status, message}` JSON envelope
//! inside a 4-byte big-endian length-prefixed frame.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP streams and the single-peer listening socket
//! - [`frame`]: Length-prefixed framing (plus a tokio codec behind `async`)
//! - [`peer`]: Envelopes, connections, listener and dialer (behind `peer` feature)

/// Re-export transport types.
pub mod transport {
    pub use gatonet_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use gatonet_frame::*;
}

/// Re-export peer types (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod peer {
    pub use gatonet_peer::*;
}
