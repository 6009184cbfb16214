use ftransport::{Config, NodeAddr, StreamChannel, Transport};
use log::*;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::os::unix::net::UnixListener;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use vsock::{VsockAddr, VsockListener};

/// Address stamped on acknowledgments sent by the server.
pub const SERVER_ADDR: NodeAddr = NodeAddr(2);
/// Address of the client node.
pub const CLIENT_ADDR: NodeAddr = NodeAddr(1);

/// How long one wait for a data frame may block.
const FRAME_TIMEOUT: Duration = Duration::from_millis(500);

/// Bytes of a received message shown in the log.
const PREVIEW_LEN: usize = 64;

#[derive(Debug, Clone)]
pub enum ServerTarget {
    Unix(PathBuf),
    Tcp(SocketAddr),
    Vsock { cid: u32, port: u32 },
}

/// Parses `unix:PATH`, `tcp:IP:PORT` or `vsock:CID:PORT`.
pub fn parse_target(s: &str) -> Result<ServerTarget, String> {
    let (scheme, rest) = s
        .split_once(':')
        .ok_or_else(|| format!("missing scheme in {:?}", s))?;
    match scheme {
        "unix" => Ok(ServerTarget::Unix(PathBuf::from(rest))),
        "tcp" => rest
            .parse()
            .map(ServerTarget::Tcp)
            .map_err(|e| format!("bad address {:?}: {}", rest, e)),
        "vsock" => {
            let (cid, port) = rest
                .split_once(':')
                .ok_or_else(|| format!("expected vsock:CID:PORT, got {:?}", s))?;
            let cid = cid.parse().map_err(|e| format!("bad cid {:?}: {}", cid, e))?;
            let port = port.parse().map_err(|e| format!("bad port {:?}: {}", port, e))?;
            Ok(ServerTarget::Vsock { cid, port })
        }
        other => Err(format!("unknown scheme {:?}", other)),
    }
}

pub struct TransServer {
    target: ServerTarget,
    config: Config,
}

impl TransServer {
    pub fn new(target: ServerTarget, config: Config) -> Self {
        Self { target, config }
    }

    /// Accepts one connection and receives one message from it.
    ///
    /// Returns `None` when the client stopped sending before the message
    /// was complete.
    pub fn run(&self) -> io::Result<Option<Vec<u8>>> {
        match &self.target {
            ServerTarget::Unix(path) => {
                if path.exists() {
                    let _ = std::fs::remove_file(path);
                }
                let listener = UnixListener::bind(path)?;
                info!("Server listening on Unix Socket {:?}", path);
                let (stream, _) = listener.accept()?;
                info!("Accepted Unix connection");
                stream.set_read_timeout(Some(FRAME_TIMEOUT))?;
                self.handle_connection(stream)
            }
            ServerTarget::Tcp(addr) => {
                let listener = TcpListener::bind(addr)?;
                info!("Server listening on TCP {:?}", addr);
                let (stream, peer) = listener.accept()?;
                info!("Accepted TCP connection from {:?}", peer);
                stream.set_read_timeout(Some(FRAME_TIMEOUT))?;
                self.handle_connection(stream)
            }
            ServerTarget::Vsock { cid, port } => {
                let listener = VsockListener::bind(&VsockAddr::new(*cid, *port))?;
                info!("Server listening on Vsock CID:{} Port:{}", cid, port);
                let (stream, addr) = listener.accept()?;
                info!("Accepted Vsock connection from {:?}", addr);
                stream.set_read_timeout(Some(FRAME_TIMEOUT))?;
                self.handle_connection(stream)
            }
        }
    }

    fn handle_connection<T: Read + Write>(&self, stream: T) -> io::Result<Option<Vec<u8>>> {
        let channel = StreamChannel::new(stream, SERVER_ADDR);
        let mut transport = Transport::new(channel, CLIENT_ADDR, self.config)?;

        let start = Instant::now();
        let message = transport.receive_message()?;
        let elapsed = start.elapsed();
        let stats = transport.receiver_stats();

        match &message {
            Some(data) => {
                info!("=== Receive Complete ===");
                info!("Total received: {} bytes", data.len());
                info!("Time: {:.3} seconds", elapsed.as_secs_f64());
                info!("Content: {:?}", preview(data));
            }
            None => warn!(
                "Receive timed out after {} frames, message discarded",
                stats.frames_received
            ),
        }
        info!(
            "Frames: {}, duplicates: {}, out of order: {}, acks: {}",
            stats.frames_received, stats.duplicates, stats.out_of_order, stats.acks_sent
        );

        Ok(message)
    }
}

/// Printable head of a message, without its terminator.
fn preview(data: &[u8]) -> String {
    let body = data.strip_suffix(&[0]).unwrap_or(data);
    let head = &body[..body.len().min(PREVIEW_LEN)];
    let mut text = String::from_utf8_lossy(head).into_owned();
    if body.len() > PREVIEW_LEN {
        text.push_str("...");
    }
    text
}
