use std::io;

use gatonet_peer::Listener;
use tracing::info;

use crate::cmd::session::{converse, Outcome, Turn};
use crate::cmd::ServeArgs;
use crate::exit::{peer_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut listener = Listener::bind(&args.endpoint.host, args.endpoint.port)
        .map_err(|err| peer_error("bind failed", err))?;
    info!(addr = %listener.local_addr(), "waiting for a player");

    listener
        .accept()
        .map_err(|err| peer_error("accept failed", err))?;
    let conn = listener
        .connection()
        .map_err(|err| peer_error("accept failed", err))?;

    let outcome = converse(
        conn,
        Turn::Send,
        &mut io::stdin().lock(),
        &mut io::stdout().lock(),
        format,
    );
    listener.close();

    if outcome? == Outcome::PeerClosed {
        info!("player left the match");
    }
    Ok(SUCCESS)
}
