use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use gatonet_transport::NetStream;
use tracing::trace;

use crate::codec::{encode_frame, Frame, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;

/// Pushes whole frames onto a byte stream.
///
/// Header and payload are staged in one buffer and written out together;
/// short writes are continued until every byte is accepted.
pub struct FrameWriter<T> {
    inner: T,
    staged: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a frame writer with the default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a frame writer that enforces `config.max_payload_size`.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            staged: BytesMut::new(),
            config,
        }
    }

    /// Write an already built [`Frame`]; same as [`send`](Self::send) on its payload.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(&frame.payload)
    }

    /// Frame `payload` and write it, then flush.
    ///
    /// A payload over the configured limit is refused before anything is
    /// written. A stream that accepts zero bytes is treated as closed.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        let max = self.config.max_payload_size;
        if payload.len() > max {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max,
            });
        }

        self.staged.clear();
        encode_frame(payload, &mut self.staged)?;
        self.write_staged()?;
        trace!(size = payload.len(), "frame sent");

        self.flush()
    }

    fn write_staged(&mut self) -> Result<()> {
        let mut remaining = &self.staged[..];
        while !remaining.is_empty() {
            match self.inner.write(remaining) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => remaining = &remaining[n..],
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    /// Flush the underlying stream, retrying interrupted flushes.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                other => return other.map_err(FrameError::Io),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Configuration this writer was built with.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Size on the wire of a frame carrying `payload_len` bytes.
    pub fn framed_len(payload_len: usize) -> usize {
        HEADER_SIZE + payload_len
    }
}

impl FrameWriter<NetStream> {
    /// Wrap a socket, applying the configured write timeout to it.
    pub fn with_config_net(inner: NetStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::net::{TcpListener, TcpStream};
    use std::time::Duration;

    use super::*;
    use crate::reader::FrameReader;

    const CLOSE: &[u8] = br#"{"status":"CLOSE","message":"Server closing"}"#;

    fn sent_bytes(payloads: &[&[u8]]) -> Vec<u8> {
        let mut writer = FrameWriter::new(Cursor::new(Vec::new()));
        for payload in payloads {
            writer.send(payload).unwrap();
        }
        writer.into_inner().into_inner()
    }

    #[test]
    fn header_is_big_endian_length() {
        let bytes = sent_bytes(&[CLOSE]);

        assert_eq!(bytes.len(), FrameWriter::<Vec<u8>>::framed_len(CLOSE.len()));
        assert_eq!(bytes[..HEADER_SIZE], (CLOSE.len() as u32).to_be_bytes());
        assert_eq!(&bytes[HEADER_SIZE..], CLOSE);
    }

    #[test]
    fn empty_payload_is_four_zero_bytes() {
        assert_eq!(sent_bytes(&[b""]), vec![0, 0, 0, 0]);
    }

    #[test]
    fn consecutive_sends_read_back_in_order() {
        let bytes = sent_bytes(&[b"first", b"", CLOSE]);
        let mut reader = FrameReader::new(Cursor::new(bytes));

        assert_eq!(reader.read_frame().unwrap().payload.as_ref(), b"first");
        assert!(reader.read_frame().unwrap().payload.is_empty());
        assert_eq!(reader.read_frame().unwrap().payload.as_ref(), CLOSE);
    }

    #[test]
    fn oversized_payload_writes_nothing() {
        let config = FrameConfig {
            max_payload_size: 8,
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::new()), config);

        assert!(matches!(
            writer.send(CLOSE),
            Err(FrameError::PayloadTooLarge { max: 8, .. })
        ));
        assert!(writer.into_inner().into_inner().is_empty());
    }

    #[test]
    fn short_writes_are_continued_and_flushed() {
        let mut writer = FrameWriter::new(Sink::accepting(3));
        writer.write_frame(&Frame::new(CLOSE)).unwrap();

        let sink = writer.into_inner();
        assert!(sink.flushed);
        let mut reader = FrameReader::new(Cursor::new(sink.data));
        assert_eq!(reader.read_frame().unwrap().payload.as_ref(), CLOSE);
    }

    #[test]
    fn interrupted_write_and_flush_are_retried() {
        let mut sink = Sink::accepting(usize::MAX);
        sink.interrupt_write = true;
        sink.interrupt_flush = true;

        let mut writer = FrameWriter::new(sink);
        writer.send(b"retry").unwrap();

        let sink = writer.into_inner();
        assert_eq!(sink.data.len(), HEADER_SIZE + 5);
        assert!(sink.flushed);
    }

    #[test]
    fn zero_byte_write_means_closed() {
        let mut writer = FrameWriter::new(Sink::accepting(0));
        assert!(matches!(
            writer.send(b"x"),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn broken_pipe_surfaces_as_io() {
        let mut writer = FrameWriter::new(Sink::failing(ErrorKind::BrokenPipe));
        assert!(matches!(
            writer.send(b"x"),
            Err(FrameError::Io(e)) if e.kind() == ErrorKind::BrokenPipe
        ));
    }

    #[test]
    fn would_block_is_not_retried() {
        let mut writer = FrameWriter::new(Sink::failing(ErrorKind::WouldBlock));
        assert!(matches!(
            writer.send(b"x"),
            Err(FrameError::Io(e)) if e.kind() == ErrorKind::WouldBlock
        ));
    }

    #[test]
    fn write_timeout_applies_to_net_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (_server, _) = listener.accept().unwrap();

        let config = FrameConfig {
            write_timeout: Some(Duration::from_millis(10)),
            ..FrameConfig::default()
        };
        let writer = FrameWriter::with_config_net(NetStream::from(client), config).unwrap();
        assert_eq!(writer.config().write_timeout, Some(Duration::from_millis(10)));
    }

    /// Scriptable `Write` double.
    #[derive(Default)]
    struct Sink {
        data: Vec<u8>,
        per_call: usize,
        fail_with: Option<ErrorKind>,
        interrupt_write: bool,
        interrupt_flush: bool,
        flushed: bool,
    }

    impl Sink {
        fn accepting(per_call: usize) -> Self {
            Self {
                per_call,
                ..Self::default()
            }
        }

        fn failing(kind: ErrorKind) -> Self {
            Self {
                fail_with: Some(kind),
                ..Self::default()
            }
        }
    }

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if let Some(kind) = self.fail_with {
                return Err(kind.into());
            }
            if std::mem::take(&mut self.interrupt_write) {
                return Err(ErrorKind::Interrupted.into());
            }
            let n = buf.len().min(self.per_call);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if std::mem::take(&mut self.interrupt_flush) {
                return Err(ErrorKind::Interrupted.into());
            }
            self.flushed = true;
            Ok(())
        }
    }
}
