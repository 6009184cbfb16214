mod trans_client;

use clap::Parser;
use ftransport::Config;
use log::info;
use trans_client::{ClientTarget, TransClient, parse_target};

const DEFAULT_SERVER_CID: u32 = 3; // qemu uses 103, pvm uses 3
const DEFAULT_SERVER_PORT: u32 = 1234;
const DEFAULT_MESSAGE: &str = "Hello from the ftransport client";

const MAX_FRAME_SIZE: usize = 1000;

/// Sends one message to an ftransport server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Server to connect to: unix:PATH, tcp:HOST:PORT or vsock:CID:PORT.
    /// Defaults to vsock at --cid and --port.
    #[arg(value_parser = parse_target)]
    target: Option<ClientTarget>,

    /// Message to send.
    #[arg(default_value = DEFAULT_MESSAGE)]
    message: String,

    /// Vsock CID used when no target is given.
    #[arg(long, default_value_t = DEFAULT_SERVER_CID)]
    cid: u32,

    /// Vsock port used when no target is given.
    #[arg(long, default_value_t = DEFAULT_SERVER_PORT)]
    port: u32,

    /// Payload bytes per frame.
    #[arg(long, default_value_t = MAX_FRAME_SIZE)]
    max_frame_size: usize,
}

impl Cli {
    fn target(&self) -> ClientTarget {
        self.target.clone().unwrap_or(ClientTarget::Vsock {
            cid: self.cid,
            port: self.port,
        })
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = Config::default().with_max_frame_size(cli.max_frame_size);
    let client = TransClient::new(cli.target(), config);

    let sent = client
        .send_message(cli.message.as_bytes())
        .expect("Failed to send message");
    info!("Client finished, {} bytes acknowledged", sent);
}
