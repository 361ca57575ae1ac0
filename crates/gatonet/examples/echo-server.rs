//! Minimal echo server: accepts one peer and acknowledges every message
//! with its own content.
//!
//! Run with:
//!   cargo run --example echo-server
//!
//! In another terminal:
//!   cargo run --features cli -- send --data hola

use gatonet::peer::{Listener, DEFAULT_HOST, DEFAULT_PORT};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut listener = Listener::bind(DEFAULT_HOST, DEFAULT_PORT)?;
    eprintln!("Listening on {}", listener.local_addr());

    loop {
        let addr = listener.accept()?;
        eprintln!("Peer connected: {addr}");

        let conn = listener.connection()?;
        loop {
            match conn.receive_data() {
                Ok(Some(message)) => {
                    eprintln!("Received: {message}");
                    conn.respond_success(message)?;
                }
                Ok(None) => {
                    eprintln!("Peer closed the connection");
                    break;
                }
                Err(e) => {
                    eprintln!("Peer disconnected: {e}");
                    break;
                }
            }
        }
        listener.close_connection();
    }
}
