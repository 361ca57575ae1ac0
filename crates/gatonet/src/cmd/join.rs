use std::io;

use gatonet_peer::dial;
use tracing::info;

use crate::cmd::session::{converse, Outcome, Turn};
use crate::cmd::JoinArgs;
use crate::exit::{peer_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: JoinArgs, format: OutputFormat) -> CliResult<i32> {
    let mut conn = dial(&args.endpoint.host, args.endpoint.port)
        .map_err(|err| peer_error("connect failed", err))?;

    let outcome = converse(
        &mut conn,
        Turn::Receive,
        &mut io::stdin().lock(),
        &mut io::stdout().lock(),
        format,
    );
    conn.close();

    if outcome? == Outcome::PeerClosed {
        info!("host ended the match");
    }
    Ok(SUCCESS)
}
