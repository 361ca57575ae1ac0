use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gatonet_peer::{Listener, Message, Status};
use tracing::{info, warn};

use crate::cmd::ListenArgs;
use crate::exit::{io_error, peer_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let mut listener = Listener::bind(&args.endpoint.host, args.endpoint.port)
        .map_err(|err| peer_error("bind failed", err))?;
    info!(addr = %listener.local_addr(), "listening");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    listener
        .accept()
        .map_err(|err| peer_error("accept failed", err))?;
    let conn = listener
        .connection()
        .map_err(|err| peer_error("accept failed", err))?;
    let peer = conn.peer_addr();

    let mut stdout = io::stdout().lock();
    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let message = match conn.receive_data() {
            Ok(Some(message)) => message,
            Ok(None) => break,
            Err(err) if err.is_disconnect() => {
                warn!(error = %err, "peer vanished without closing");
                break;
            }
            Err(err) => return Err(peer_error("receive failed", err)),
        };

        print_message(&mut stdout, Status::Data, &message, peer, format)
            .map_err(|err| io_error("write failed", err))?;

        let reply = if is_rejected(&message, args.reject.as_deref()) {
            warn!(%message, "rejecting message");
            conn.respond_error(format!("rejected: {message}"))
        } else {
            conn.respond_success("")
        };
        reply.map_err(|err| peer_error("reply failed", err))?;

        printed = printed.saturating_add(1);
        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    listener.close();
    Ok(SUCCESS)
}

fn is_rejected(message: &Message, reject: Option<&str>) -> bool {
    reject.is_some_and(|reject| message.as_text() == Some(reject))
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn only_matching_text_is_rejected() {
        assert!(is_rejected(&Message::from("trampa"), Some("trampa")));
        assert!(!is_rejected(&Message::from("jugada"), Some("trampa")));
        assert!(!is_rejected(&Message::from("trampa"), None));
        assert!(!is_rejected(&Message::from(json!({"trampa": true})), Some("trampa")));
    }
}
