use clap::{Args, Subcommand};
use gatonet_peer::{DEFAULT_HOST, DEFAULT_PORT};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod join;
pub mod listen;
pub mod send;
pub mod serve;
pub mod session;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Host a match: wait for one player, then take turns starting with you.
    Serve(ServeArgs),
    /// Join a hosted match: the host moves first.
    Join(JoinArgs),
    /// Send a single message and wait for its acknowledgement.
    Send(SendArgs),
    /// Accept one peer and print every message it sends.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Join(args) => join::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Clone)]
pub struct EndpointArgs {
    /// Host to bind or connect to.
    #[arg(long, env = "GATONET_HOST", default_value = DEFAULT_HOST)]
    pub host: String,
    /// TCP port.
    #[arg(long, env = "GATONET_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,
}

#[derive(Args, Debug)]
pub struct JoinArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,
    /// JSON message (sent as a structured value).
    #[arg(long, conflicts_with = "data", required_unless_present = "data")]
    pub json: Option<String>,
    /// Text message.
    #[arg(long, conflicts_with = "json")]
    pub data: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Answer ERROR instead of SUCCESS to text messages equal to this value.
    #[arg(long, value_name = "TEXT")]
    pub reject: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
