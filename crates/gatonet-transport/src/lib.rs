//! TCP transport for gatonet.
//!
//! This is the lowest layer of gatonet. It owns the OS sockets and exposes:
//! - [`NetStream`], a connected byte stream (Read + Write) with keep-alive
//!   and half-close controls
//! - [`TcpSocket`], a listening socket that accepts one peer at a time
//!
//! Everything else builds on top of [`NetStream`].

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::NetStream;
pub use tcp::TcpSocket;
