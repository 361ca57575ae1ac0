use std::io::{self, IsTerminal, Write};
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use gatonet_peer::{Message, Status};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    status: &'static str,
    kind: &'static str,
    message: &'a Message,
    peer: Option<String>,
    timestamp: String,
}

/// Write one received message to `out` in the chosen format.
pub fn print_message<W: Write>(
    out: &mut W,
    status: Status,
    message: &Message,
    peer: Option<SocketAddr>,
    format: OutputFormat,
) -> io::Result<()> {
    let peer_label = peer.map_or_else(|| "-".to_string(), |addr| addr.to_string());
    match format {
        OutputFormat::Json => {
            let record = MessageOutput {
                status: status.as_str(),
                kind: kind(message),
                message,
                peer: peer.map(|addr| addr.to_string()),
                timestamp: now_unix_seconds(),
            };
            let line = serde_json::to_string(&record).map_err(io::Error::other)?;
            writeln!(out, "{line}")?;
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["STATUS", "KIND", "PEER", "MESSAGE"])
                .add_row(vec![
                    status.as_str().to_string(),
                    kind(message).to_string(),
                    peer_label,
                    message.to_string(),
                ]);
            writeln!(out, "{table}")?;
        }
        OutputFormat::Pretty => {
            writeln!(out, "[{peer_label}] {message}")?;
        }
        OutputFormat::Raw => {
            writeln!(out, "{message}")?;
        }
    }
    out.flush()
}

fn kind(message: &Message) -> &'static str {
    match message {
        Message::Text(_) => "text",
        Message::Structured(_) => "json",
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
