//! Length-prefixed message framing for gatonet.
//!
//! Every message travels as one frame:
//! - A 4-byte big-endian unsigned payload length
//! - Exactly that many payload bytes
//!
//! There is no magic number and no delimiter; the receiver always reads the
//! declared length. Partial reads and writes are looped internally, so callers
//! only ever see complete frames.

pub mod codec;
pub mod error;
pub mod reader;
#[cfg(feature = "async")]
pub mod tokio_codec;
pub mod writer;

pub use codec::{
    decode_frame, decode_length, encode, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD,
    HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
#[cfg(feature = "async")]
pub use tokio_codec::FrameCodec;
pub use writer::FrameWriter;
