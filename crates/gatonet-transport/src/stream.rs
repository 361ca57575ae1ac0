use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::Result;

/// A connected TCP stream implementing Read + Write.
///
/// This is the fundamental I/O type returned by transport operations. Besides
/// plain I/O it exposes the socket controls the protocol relies on:
/// keep-alive probing and shutting down both directions before release.
pub struct NetStream {
    inner: TcpStream,
}

impl Read for NetStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for NetStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl From<TcpStream> for NetStream {
    fn from(inner: TcpStream) -> Self {
        Self { inner }
    }
}

impl NetStream {
    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new handle to the same socket).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self::from(cloned))
    }

    /// Address of the remote peer.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.inner.peer_addr().map_err(Into::into)
    }

    /// Local address of this end of the stream.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.inner.local_addr().map_err(Into::into)
    }

    /// Shut down both the transmit and receive directions.
    ///
    /// Affects every clone of this stream, since they share one socket.
    pub fn shutdown(&self) -> Result<()> {
        self.inner.shutdown(Shutdown::Both).map_err(Into::into)
    }

    /// Enable or disable `SO_KEEPALIVE` probing.
    ///
    /// With probing enabled a peer that vanishes without a TCP close (power
    /// loss, cable pulled) is eventually reported as a read error instead of
    /// blocking forever.
    pub fn set_keepalive(&self, enabled: bool) -> Result<()> {
        sys::set_keepalive(&self.inner, enabled).map_err(Into::into)
    }

    /// Whether `SO_KEEPALIVE` is currently enabled.
    pub fn keepalive(&self) -> Result<bool> {
        sys::keepalive(&self.inner).map_err(Into::into)
    }
}

impl std::fmt::Debug for NetStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetStream")
            .field("type", &"tcp")
            .field("peer", &self.inner.peer_addr().ok())
            .finish()
    }
}

#[cfg(unix)]
mod sys {
    use std::net::TcpStream;
    use std::os::fd::AsRawFd;

    pub(super) fn set_keepalive(stream: &TcpStream, enabled: bool) -> std::io::Result<()> {
        let value = libc::c_int::from(enabled);

        // SAFETY: `value` outlives the call and its size is passed alongside it;
        // the descriptor is an open socket owned by `stream`.
        let rc = unsafe {
            libc::setsockopt(
                stream.as_raw_fd(),
                libc::SOL_SOCKET,
                libc::SO_KEEPALIVE,
                (&value as *const libc::c_int).cast::<libc::c_void>(),
                std::mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };

        if rc == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }

    pub(super) fn keepalive(stream: &TcpStream) -> std::io::Result<bool> {
        let mut value: libc::c_int = 0;
        let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;

        // SAFETY: `value` and `len` are valid writable pointers for the provided sizes,
        // and the descriptor is an open socket owned by `stream`.
        let rc = unsafe {
            libc::getsockopt(
                stream.as_raw_fd(),
                libc::SOL_SOCKET,
                libc::SO_KEEPALIVE,
                (&mut value as *mut libc::c_int).cast::<libc::c_void>(),
                &mut len,
            )
        };

        if rc == 0 {
            Ok(value != 0)
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

#[cfg(windows)]
mod sys {
    use std::net::TcpStream;
    use std::os::windows::io::AsRawSocket;

    use windows_sys::Win32::Networking::WinSock::{
        getsockopt, setsockopt, SOCKET, SOCKET_ERROR, SOL_SOCKET, SO_KEEPALIVE,
    };

    pub(super) fn set_keepalive(stream: &TcpStream, enabled: bool) -> std::io::Result<()> {
        let value = i32::from(enabled);

        // SAFETY: `value` outlives the call and its size is passed alongside it;
        // the socket handle is owned by `stream`.
        let rc = unsafe {
            setsockopt(
                stream.as_raw_socket() as SOCKET,
                SOL_SOCKET,
                SO_KEEPALIVE,
                (&value as *const i32).cast::<u8>(),
                std::mem::size_of::<i32>() as i32,
            )
        };

        if rc == SOCKET_ERROR {
            Err(std::io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    pub(super) fn keepalive(stream: &TcpStream) -> std::io::Result<bool> {
        let mut value: i32 = 0;
        let mut len = std::mem::size_of::<i32>() as i32;

        // SAFETY: `value` and `len` are valid writable pointers for the provided sizes,
        // and the socket handle is owned by `stream`.
        let rc = unsafe {
            getsockopt(
                stream.as_raw_socket() as SOCKET,
                SOL_SOCKET,
                SO_KEEPALIVE,
                (&mut value as *mut i32).cast::<u8>(),
                &mut len,
            )
        };

        if rc == SOCKET_ERROR {
            Err(std::io::Error::last_os_error())
        } else {
            Ok(value != 0)
        }
    }
}

#[cfg(not(any(unix, windows)))]
mod sys {
    use std::net::TcpStream;

    pub(super) fn set_keepalive(_stream: &TcpStream, _enabled: bool) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "keep-alive is not supported on this platform",
        ))
    }

    pub(super) fn keepalive(_stream: &TcpStream) -> std::io::Result<bool> {
        Ok(false)
    }
}
