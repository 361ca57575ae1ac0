use std::fmt;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{PeerError, Result};
use crate::status::Status;

/// Envelope body: plain text or any structured JSON value.
///
/// The protocol never looks inside; only the application gives it a shape
/// (a chat line, a board move, a game result). A JSON string is always
/// [`Message::Text`]: the constructors normalize it, and a hand-built
/// `Structured(Value::String(..))` comes back as `Text` after a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Text(String),
    Structured(serde_json::Value),
}

impl Message {
    /// Serialize any value into a structured message.
    pub fn structured<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        Ok(Message::from(serde_json::to_value(value)?))
    }

    /// Decode the message into an application type.
    ///
    /// Text messages decode as a JSON string.
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        match self {
            Message::Text(text) => T::deserialize(serde_json::Value::String(text.clone())),
            Message::Structured(value) => T::deserialize(value),
        }
    }

    /// The text, if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text(text) => Some(text),
            Message::Structured(_) => None,
        }
    }

    /// True for the empty text message and for JSON `null`.
    pub fn is_empty(&self) -> bool {
        match self {
            Message::Text(text) => text.is_empty(),
            Message::Structured(value) => value.is_null(),
        }
    }
}

impl Default for Message {
    fn default() -> Self {
        Message::Text(String::new())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Text(text) => f.write_str(text),
            Message::Structured(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<serde_json::Value> for Message {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => Message::Text(text),
            other => Message::Structured(other),
        }
    }
}

/// The `{status, message}` record carried in every frame payload.
///
/// On the wire it is UTF-8 JSON:
/// ```text
/// {"status":"ENVIO_DATOS","message":"hello"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: Status,
    pub message: Message,
}

impl Envelope {
    /// Build an envelope. No validation beyond the closed `Status` type.
    pub fn new(message: impl Into<Message>, status: Status) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Serialize into frame payload bytes.
    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    /// Decode frame payload bytes into an envelope.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).map_err(PeerError::MalformedEnvelope)
    }

    /// Decode frame payload bytes into its tag and message.
    ///
    /// Fails with [`PeerError::MalformedEnvelope`] if the bytes are not JSON,
    /// `status` is missing or not a known tag, or `message` is missing.
    pub fn parse(payload: &[u8]) -> Result<(Status, Message)> {
        Ok(Self::decode(payload)?.into_parts())
    }

    /// Split into tag and message.
    pub fn into_parts(self) -> (Status, Message) {
        (self.status, self.message)
    }
}
