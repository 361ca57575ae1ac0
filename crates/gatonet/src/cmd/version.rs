use gatonet_frame::HEADER_SIZE;
use gatonet_peer::{Status, DEFAULT_HOST, DEFAULT_PORT};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("gatonet {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: gatonet");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("GATONET_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("GATONET_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!(
        "features: peer={}, async={}, cli=true",
        cfg!(feature = "peer"),
        cfg!(feature = "async")
    );
    println!("frame_header: {HEADER_SIZE} bytes, big-endian length");
    let statuses: Vec<&str> = Status::ALL.iter().map(|status| status.as_str()).collect();
    println!("statuses: {}", statuses.join(", "));
    println!("default_endpoint: {DEFAULT_HOST}:{DEFAULT_PORT}");

    Ok(SUCCESS)
}
