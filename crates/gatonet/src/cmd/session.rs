//! The turn-taking loop shared by `serve` and `join`.

use std::io::{self, BufRead, Write};

use gatonet_peer::{Connection, PeerError, Status};
use tracing::info;

use crate::exit::{io_error, peer_error, CliResult};
use crate::output::{print_message, OutputFormat};

/// Typed at the prompt (any case) to leave the match.
pub const EXIT_WORD: &str = "exit";

/// Whose move comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Send,
    Receive,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The local player typed `exit` or closed stdin.
    LocalExit,
    /// The peer sent `CLOSE`.
    PeerClosed,
}

/// Alternate sending lines from `input` and printing the peer's messages.
///
/// Every received message is acknowledged with `SUCCESS`. A remote `ERROR`
/// reply aborts the session with a non-zero exit code.
pub fn converse<R, W>(
    conn: &mut Connection,
    first: Turn,
    input: &mut R,
    out: &mut W,
    format: OutputFormat,
) -> CliResult<Outcome>
where
    R: BufRead,
    W: Write,
{
    let mut turn = first;
    loop {
        turn = match turn {
            Turn::Send => {
                let Some(line) = read_move(input)? else {
                    return Ok(Outcome::LocalExit);
                };
                match conn.send_data(line) {
                    Ok(_) => Turn::Receive,
                    Err(PeerError::ConnectionClosed) => return Ok(Outcome::PeerClosed),
                    Err(err) => return Err(peer_error("send failed", err)),
                }
            }
            Turn::Receive => {
                let message = match conn.receive_data() {
                    Ok(Some(message)) => message,
                    Ok(None) => return Ok(Outcome::PeerClosed),
                    Err(err) => return Err(peer_error("receive failed", err)),
                };
                print_message(out, Status::Data, &message, conn.peer_addr(), format)
                    .map_err(|err| io_error("write failed", err))?;
                conn.respond_success("")
                    .map_err(|err| peer_error("acknowledge failed", err))?;
                Turn::Send
            }
        };
    }
}

/// Prompt on stderr and read one line. `None` on `exit` or end of input.
fn read_move<R: BufRead>(input: &mut R) -> CliResult<Option<String>> {
    let mut stderr = io::stderr();
    let _ = write!(stderr, "> ");
    let _ = stderr.flush();

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|err| io_error("reading stdin failed", err))?;
    if read == 0 {
        info!("end of input");
        return Ok(None);
    }

    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().eq_ignore_ascii_case(EXIT_WORD) {
        return Ok(None);
    }
    Ok(Some(line.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::thread;

    use gatonet_peer::{dial, Listener, Message};

    use super::*;

    fn listen() -> (Listener, u16) {
        let listener = Listener::bind("127.0.0.1", 0).expect("listener should bind");
        let port = listener.local_addr().port();
        (listener, port)
    }

    #[test]
    fn sender_exits_on_exit_word() {
        let (mut listener, port) = listen();

        let peer = thread::spawn(move || {
            let mut conn = dial("127.0.0.1", port).expect("peer should connect");
            let first = conn.receive_data().expect("receive should succeed");
            conn.respond_success("").expect("ack should send");
            conn.send_data("bien").expect("reply should be acknowledged");
            let after_exit = conn.receive_data().expect("receive should succeed");
            (first, after_exit)
        });

        listener.accept().expect("listener should accept");
        let conn = listener.connection().expect("connection should be open");
        let mut input = Cursor::new("hola\nexit\nignored\n");
        let mut out = Vec::new();

        let outcome = converse(conn, Turn::Send, &mut input, &mut out, OutputFormat::Raw)
            .expect("session should succeed");
        assert_eq!(outcome, Outcome::LocalExit);
        assert_eq!(String::from_utf8(out).expect("utf-8"), "bien\n");

        listener.close();
        let (first, after_exit) = peer.join().expect("peer thread should finish");
        assert_eq!(first, Some(Message::from("hola")));
        assert_eq!(after_exit, None);
    }

    #[test]
    fn receiver_stops_when_peer_closes() {
        let (mut listener, port) = listen();

        let peer = thread::spawn(move || {
            listener.accept().expect("listener should accept");
            let conn = listener.connection().expect("connection should be open");
            conn.send_data("primero").expect("move should be acknowledged");
            let answer = conn.receive_data().expect("receive should succeed");
            conn.respond_success("").expect("ack should send");
            listener.close();
            answer
        });

        let mut conn = dial("127.0.0.1", port).expect("client should connect");
        let mut input = Cursor::new("segundo\n");
        let mut out = Vec::new();

        let outcome = converse(&mut conn, Turn::Receive, &mut input, &mut out, OutputFormat::Raw)
            .expect("session should succeed");
        assert_eq!(outcome, Outcome::PeerClosed);
        assert_eq!(String::from_utf8(out).expect("utf-8"), "primero\n");
        assert!(!conn.is_open());

        let answer = peer.join().expect("server thread should finish");
        assert_eq!(answer, Some(Message::from("segundo")));
    }

    #[test]
    fn exit_word_ignores_case_and_padding() {
        for input in ["EXIT\n", "Exit\r\n", "  exit  \n"] {
            let mut cursor = Cursor::new(input);
            assert_eq!(read_move(&mut cursor).expect("read should succeed"), None, "{input:?}");
        }
        let mut cursor = Cursor::new("exits\n");
        assert_eq!(
            read_move(&mut cursor).expect("read should succeed").as_deref(),
            Some("exits")
        );
    }

    #[test]
    fn end_of_input_is_a_local_exit() {
        let (mut listener, port) = listen();
        let _peer = dial("127.0.0.1", port).expect("peer should connect");
        listener.accept().expect("listener should accept");

        let conn = listener.connection().expect("connection should be open");
        let outcome = converse(
            conn,
            Turn::Send,
            &mut Cursor::new(""),
            &mut Vec::new(),
            OutputFormat::Raw,
        )
        .expect("session should succeed");
        assert_eq!(outcome, Outcome::LocalExit);
    }

    #[test]
    fn remote_error_fails_the_session() {
        let (mut listener, port) = listen();

        let peer = thread::spawn(move || {
            let mut conn = dial("127.0.0.1", port).expect("peer should connect");
            conn.receive_data().expect("receive should succeed");
            conn.respond_error("casilla ocupada").expect("error should send");
            conn
        });

        listener.accept().expect("listener should accept");
        let conn = listener.connection().expect("connection should be open");
        let err = converse(
            conn,
            Turn::Send,
            &mut Cursor::new("1 1\n"),
            &mut Vec::new(),
            OutputFormat::Raw,
        )
        .unwrap_err();
        assert_eq!(err.code, crate::exit::REMOTE_ERROR);
        assert!(err.message.contains("casilla ocupada"));

        drop(peer.join().expect("peer thread should finish"));
    }
}
