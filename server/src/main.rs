mod trans_server;

use clap::Parser;
use ftransport::Config;
use log::info;
use trans_server::{ServerTarget, TransServer, parse_target};
use vsock::VMADDR_CID_ANY;

const DEFAULT_SERVER_PORT: u32 = 1234;

const MAX_FRAME_SIZE: usize = 1000;

/// Receives one message from an ftransport client.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Address to listen on: unix:PATH, tcp:IP:PORT or vsock:CID:PORT.
    /// Defaults to vsock at --cid and --port.
    #[arg(value_parser = parse_target)]
    target: Option<ServerTarget>,

    /// Vsock CID used when no target is given.
    #[arg(long, default_value_t = VMADDR_CID_ANY)]
    cid: u32,

    /// Vsock port used when no target is given.
    #[arg(long, default_value_t = DEFAULT_SERVER_PORT)]
    port: u32,

    /// Payload bytes per frame.
    #[arg(long, default_value_t = MAX_FRAME_SIZE)]
    max_frame_size: usize,
}

impl Cli {
    fn target(&self) -> ServerTarget {
        self.target.clone().unwrap_or(ServerTarget::Vsock {
            cid: self.cid,
            port: self.port,
        })
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = Config::default().with_max_frame_size(cli.max_frame_size);
    let server = TransServer::new(cli.target(), config);

    match server.run().expect("Server failed") {
        Some(message) => info!("Server finished, {} bytes received", message.len()),
        None => info!("Server finished without a complete message"),
    }
}
