use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tag carried by every envelope.
///
/// The set is closed: a peer sending any other tag is violating the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Acknowledges a `Data` envelope.
    #[serde(rename = "SUCCESS")]
    Success,
    /// Rejects a `Data` envelope; the message explains why.
    #[serde(rename = "ERROR")]
    Error,
    /// Application payload that expects exactly one reply.
    #[serde(rename = "ENVIO_DATOS")]
    Data,
    /// The sender is closing the connection.
    #[serde(rename = "CLOSE")]
    Close,
}

impl Status {
    /// All tags, in wire order.
    pub const ALL: [Status; 4] = [Status::Success, Status::Error, Status::Data, Status::Close];

    /// Wire name of the tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::Error => "ERROR",
            Status::Data => "ENVIO_DATOS",
            Status::Close => "CLOSE",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not a known wire tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status tag '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_serde() {
        for status in Status::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("ENVIO_DATOS".parse::<Status>().unwrap(), Status::Data);
        assert_eq!("CLOSE".parse::<Status>().unwrap(), Status::Close);
    }

    #[test]
    fn rejects_unknown_and_wrong_case() {
        assert_eq!(
            "BOGUS".parse::<Status>().unwrap_err(),
            UnknownStatus("BOGUS".to_string())
        );
        assert!("success".parse::<Status>().is_err());
        assert!(serde_json::from_str::<Status>("\"DATA\"").is_err());
    }
}
