use std::io;

use gatonet_peer::{dial, Message, Status};

use crate::cmd::SendArgs;
use crate::exit::{io_error, peer_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let message = resolve_message(&args)?;
    let mut conn = dial(&args.endpoint.host, args.endpoint.port)
        .map_err(|err| peer_error("connect failed", err))?;

    let reply = conn.send_data(message);
    let peer = conn.peer_addr();
    conn.close();

    let reply = reply.map_err(|err| peer_error("send failed", err))?;
    if !reply.is_empty() {
        print_message(&mut io::stdout().lock(), Status::Success, &reply, peer, format)
            .map_err(|err| io_error("write failed", err))?;
    }
    Ok(SUCCESS)
}

fn resolve_message(args: &SendArgs) -> CliResult<Message> {
    if let Some(json) = &args.json {
        let value = serde_json::from_str::<serde_json::Value>(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
        return Ok(Message::from(value));
    }
    Ok(Message::from(args.data.clone().unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cmd::EndpointArgs;

    fn args(json: Option<&str>, data: Option<&str>) -> SendArgs {
        SendArgs {
            endpoint: EndpointArgs {
                host: "127.0.0.1".into(),
                port: 0,
            },
            json: json.map(str::to_string),
            data: data.map(str::to_string),
        }
    }

    #[test]
    fn json_payload_becomes_structured_message() {
        let message = resolve_message(&args(Some(r#"{"fila":0,"columna":2}"#), None))
            .expect("valid json");
        assert_eq!(message, Message::from(json!({"fila": 0, "columna": 2})));
    }

    #[test]
    fn data_payload_stays_text() {
        let message = resolve_message(&args(None, Some("{not json"))).expect("text is accepted");
        assert_eq!(message.as_text(), Some("{not json"));
    }

    #[test]
    fn invalid_json_is_a_usage_error() {
        let err = resolve_message(&args(Some("{oops"), None)).unwrap_err();
        assert_eq!(err.code, USAGE);
    }
}
