use ftransport::{Config, NodeAddr, StreamChannel, Transport};
use log::*;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use vsock::{VsockAddr, VsockStream};

/// Address stamped on frames sent by the client.
pub const CLIENT_ADDR: NodeAddr = NodeAddr(1);
/// Address of the server node.
pub const SERVER_ADDR: NodeAddr = NodeAddr(2);

/// How long one wait for an acknowledgment may block.
const ACK_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub enum ClientTarget {
    Unix(PathBuf),
    Tcp(String),
    Vsock { cid: u32, port: u32 },
}

/// Parses `unix:PATH`, `tcp:HOST:PORT` or `vsock:CID:PORT`.
pub fn parse_target(s: &str) -> Result<ClientTarget, String> {
    let (scheme, rest) = s
        .split_once(':')
        .ok_or_else(|| format!("missing scheme in {:?}", s))?;
    match scheme {
        "unix" => Ok(ClientTarget::Unix(PathBuf::from(rest))),
        "tcp" => Ok(ClientTarget::Tcp(rest.to_string())),
        "vsock" => {
            let (cid, port) = rest
                .split_once(':')
                .ok_or_else(|| format!("expected vsock:CID:PORT, got {:?}", s))?;
            let cid = cid.parse().map_err(|e| format!("bad cid {:?}: {}", cid, e))?;
            let port = port.parse().map_err(|e| format!("bad port {:?}: {}", port, e))?;
            Ok(ClientTarget::Vsock { cid, port })
        }
        other => Err(format!("unknown scheme {:?}", other)),
    }
}

pub struct TransClient {
    target: ClientTarget,
    config: Config,
}

impl TransClient {
    pub fn new(target: ClientTarget, config: Config) -> Self {
        Self { target, config }
    }

    /// Connects to the target and sends one message.
    ///
    /// Returns the number of acknowledged bytes.
    pub fn send_message(&self, message: &[u8]) -> io::Result<usize> {
        info!("Connecting to target: {:?}", self.target);
        match &self.target {
            ClientTarget::Unix(path) => {
                let stream = UnixStream::connect(path)?;
                stream.set_read_timeout(Some(ACK_TIMEOUT))?;
                info!("Unix socket connected.");
                self.process_stream(stream, message)
            }
            ClientTarget::Tcp(addr) => {
                let stream = TcpStream::connect(addr.as_str())?;
                stream.set_read_timeout(Some(ACK_TIMEOUT))?;
                info!("TCP socket connected.");
                self.process_stream(stream, message)
            }
            ClientTarget::Vsock { cid, port } => {
                let stream = VsockStream::connect(&VsockAddr::new(*cid, *port))?;
                stream.set_read_timeout(Some(ACK_TIMEOUT))?;
                info!("Vsock socket connected.");
                self.process_stream(stream, message)
            }
        }
    }

    fn process_stream<T: Read + Write>(&self, stream: T, message: &[u8]) -> io::Result<usize> {
        let channel = StreamChannel::new(stream, CLIENT_ADDR);
        let mut transport = Transport::new(channel, SERVER_ADDR, self.config)?;

        let start = Instant::now();
        let sent = transport.send(message)?;
        let elapsed = start.elapsed();
        let stats = transport.sender_stats();

        info!("=== Send Complete ===");
        info!("Total sent: {} of {} bytes", sent, message.len() + 1);
        info!("Time: {:.3} seconds", elapsed.as_secs_f64());
        info!(
            "Frames: {}, retransmissions: {} ({:.1}%)",
            stats.frames_sent,
            stats.retransmissions,
            stats.retransmit_rate()
        );
        if stats.exhausted {
            warn!("Server stopped acknowledging, message incomplete");
        }

        Ok(sent)
    }
}
