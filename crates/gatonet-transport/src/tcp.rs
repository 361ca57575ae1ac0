use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::NetStream;

/// TCP listening socket.
///
/// Binds with a pending-connection backlog of one: the protocol serves a
/// single peer at a time, so there is no reason to queue more.
pub struct TcpSocket {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpSocket {
    /// Backlog passed to `listen(2)`.
    pub const BACKLOG: i32 = 1;

    /// Bind and listen on `host:port`.
    ///
    /// Every address `host` resolves to is tried in order; the first that
    /// binds wins. Port 0 asks the OS for an ephemeral port, see
    /// [`TcpSocket::local_addr`].
    pub fn bind(host: &str, port: u16) -> Result<Self> {
        let endpoint = format!("{host}:{port}");
        let addrs = resolve(host, port).map_err(|source| TransportError::Bind {
            addr: endpoint.clone(),
            source,
        })?;
        if addrs.is_empty() {
            return Err(TransportError::Resolve { addr: endpoint });
        }

        let listener = TcpListener::bind(&addrs[..]).map_err(|source| TransportError::Bind {
            addr: endpoint.clone(),
            source,
        })?;
        restrict_backlog(&listener).map_err(|source| TransportError::Bind {
            addr: endpoint.clone(),
            source,
        })?;
        let local_addr = listener.local_addr().map_err(|source| TransportError::Bind {
            addr: endpoint,
            source,
        })?;

        info!(%local_addr, backlog = Self::BACKLOG, "listening on tcp socket");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<(NetStream, SocketAddr)> {
        let (stream, addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%addr, "accepted connection");
        Ok((NetStream::from(stream), addr))
    }

    /// Connect to a listening socket (blocking).
    pub fn connect(host: &str, port: u16) -> Result<NetStream> {
        let endpoint = format!("{host}:{port}");
        let stream = TcpStream::connect((host, port)).map_err(|source| {
            TransportError::Connect {
                addr: endpoint.clone(),
                source,
            }
        })?;
        debug!(addr = %endpoint, "connected to tcp socket");
        Ok(NetStream::from(stream))
    }

    /// Connect with an upper bound on the time spent per resolved address.
    pub fn connect_timeout(host: &str, port: u16, timeout: Duration) -> Result<NetStream> {
        let endpoint = format!("{host}:{port}");
        let addrs = resolve(host, port).map_err(|source| TransportError::Connect {
            addr: endpoint.clone(),
            source,
        })?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    debug!(%addr, ?timeout, "connected to tcp socket");
                    return Ok(NetStream::from(stream));
                }
                Err(err) => {
                    debug!(%addr, error = %err, "connect attempt failed");
                    last_err = Some(err);
                }
            }
        }

        match last_err {
            Some(source) => Err(TransportError::Connect {
                addr: endpoint,
                source,
            }),
            None => Err(TransportError::Resolve { addr: endpoint }),
        }
    }

    /// The address this socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }
}

impl std::fmt::Debug for TcpSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpSocket")
            .field("local_addr", &self.local_addr)
            .finish()
    }
}

fn resolve(host: &str, port: u16) -> std::io::Result<Vec<SocketAddr>> {
    Ok((host, port).to_socket_addrs()?.collect())
}

/// Re-issue `listen(2)` so the kernel backlog shrinks to [`TcpSocket::BACKLOG`].
///
/// std always listens with its own default backlog; calling `listen` again on
/// a listening socket only updates the queue length.
#[cfg(unix)]
fn restrict_backlog(listener: &TcpListener) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    // SAFETY: the descriptor is an open, bound, listening socket owned by `listener`.
    let rc = unsafe { libc::listen(listener.as_raw_fd(), TcpSocket::BACKLOG) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

// Winsock ignores a second listen() on a listening socket.
#[cfg(not(unix))]
fn restrict_backlog(_listener: &TcpListener) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_bind_accept_connect() {
        let listener = TcpSocket::bind("127.0.0.1", 0).unwrap();
        let port = listener.local_addr().port();
        assert_ne!(port, 0);

        let handle = std::thread::spawn(move || {
            let mut client = TcpSocket::connect("127.0.0.1", port).unwrap();
            client.write_all(b"hello").unwrap();
            client.local_addr().unwrap()
        });

        let (mut server, peer) = listener.accept().unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        let client_addr = handle.join().unwrap();
        assert_eq!(peer, client_addr);
    }

    #[test]
    fn test_bind_port_in_use() {
        let first = TcpSocket::bind("127.0.0.1", 0).unwrap();
        let port = first.local_addr().port();

        let result = TcpSocket::bind("127.0.0.1", port);
        assert!(matches!(result, Err(TransportError::Bind { .. })));
    }

    #[test]
    fn test_connect_refused() {
        let port = {
            let socket = TcpSocket::bind("127.0.0.1", 0).unwrap();
            socket.local_addr().port()
        };

        let result = TcpSocket::connect("127.0.0.1", port);
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[test]
    fn test_connect_timeout_succeeds_against_listener() {
        let listener = TcpSocket::bind("127.0.0.1", 0).unwrap();
        let port = listener.local_addr().port();

        let stream =
            TcpSocket::connect_timeout("127.0.0.1", port, Duration::from_secs(2)).unwrap();
        let (_server, peer) = listener.accept().unwrap();
        assert_eq!(stream.local_addr().unwrap(), peer);
    }

    #[test]
    fn test_transport_name() {
        let listener = TcpSocket::bind("127.0.0.1", 0).unwrap();
        assert_eq!(listener.transport_name(), "tcp");
    }
}
