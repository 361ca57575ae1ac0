//! Peer connections for gatonet.
//!
//! This is the layer the game talks to. A [`Connection`] carries
//! status-tagged [`Envelope`]s inside length-prefixed frames and knows how to
//! say goodbye: `close()` tells the peer with a `CLOSE` envelope before the
//! socket is released. A [`Listener`] serves one peer at a time, [`dial`]
//! reaches a remote listener.
//!
//! ```no_run
//! use gatonet_peer::{dial, DEFAULT_PORT};
//!
//! # fn main() -> gatonet_peer::Result<()> {
//! let mut conn = dial("localhost", DEFAULT_PORT)?;
//! conn.send_data("hello")?; // blocks until the peer acknowledges
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod connector;
pub mod envelope;
pub mod error;
pub mod listener;
pub mod status;

pub use connection::Connection;
pub use connector::{dial, dial_with_config, DialConfig};
pub use envelope::{Envelope, Message};
pub use error::{PeerError, Result};
pub use listener::Listener;
pub use status::Status;

/// Host used by the demo client and server when none is given.
pub const DEFAULT_HOST: &str = "localhost";

/// Port used by the demo client and server when none is given.
pub const DEFAULT_PORT: u16 = 54321;
