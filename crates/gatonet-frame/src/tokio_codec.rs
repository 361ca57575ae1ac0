//! `tokio_util::codec` adapter for the gatonet wire format.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, Frame, DEFAULT_MAX_PAYLOAD};
use crate::error::{FrameError, Result};

/// Length-prefixed codec for use with `FramedRead` / `FramedWrite`.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_payload_size: usize,
}

impl FrameCodec {
    /// Codec bounded only by the 4-byte header.
    pub fn new() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD)
    }

    /// Codec rejecting payloads larger than `max_payload_size`.
    pub fn with_max_payload(max_payload_size: usize) -> Self {
        Self { max_payload_size }
    }

    /// Maximum accepted payload size.
    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        decode_frame(src, self.max_payload_size)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::ConnectionClosed),
        }
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        if item.len() > self.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: item.len(),
                max: self.max_payload_size,
            });
        }
        encode_frame(&item, dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio::io::AsyncWriteExt;
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;

    #[tokio::test]
    async fn framed_roundtrip_over_duplex() {
        let (left, right) = tokio::io::duplex(64);
        let mut tx = FramedWrite::new(left, FrameCodec::new());
        let mut rx = FramedRead::new(right, FrameCodec::new());

        tx.send(Bytes::from_static(b"ping")).await.unwrap();
        tx.send(Bytes::from_static(b"pong")).await.unwrap();

        let first = rx.next().await.unwrap().unwrap();
        let second = rx.next().await.unwrap().unwrap();
        assert_eq!(first.payload.as_ref(), b"ping");
        assert_eq!(second.payload.as_ref(), b"pong");
    }

    #[tokio::test]
    async fn clean_eof_ends_stream() {
        let (left, right) = tokio::io::duplex(64);
        drop(left);

        let mut rx = FramedRead::new(right, FrameCodec::new());
        assert!(rx.next().await.is_none());
    }

    #[tokio::test]
    async fn eof_after_header_is_connection_closed() {
        let (mut left, right) = tokio::io::duplex(64);
        left.write_all(&[0, 0, 0, 9]).await.unwrap();
        drop(left);

        let mut rx = FramedRead::new(right, FrameCodec::new());
        let err = rx.next().await.unwrap().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[tokio::test]
    async fn oversized_item_is_rejected_on_encode() {
        let (left, _right) = tokio::io::duplex(64);
        let mut tx = FramedWrite::new(left, FrameCodec::with_max_payload(2));

        let err = tx.send(Bytes::from_static(b"abc")).await.unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 3, max: 2 }));
    }
}
