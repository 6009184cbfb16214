//! Transport facade and main API.
//!
//! `Transport` ties a channel, a peer address and a configuration together
//! and runs one stop-and-wait conversation per `send` or `receive` call.

use alloc::vec::Vec;

use crate::channel::Channel;
use crate::config::{AckPolicy, Config};
use crate::core::NodeAddr;
use crate::error::Result;
use crate::reliable::{ReceiverStats, SenderStats, SliceReceiver, StopAndWaitSender};

/// Reliable message transport over a [`Channel`].
///
/// # Example
///
/// ```rust,ignore
/// use ftransport::{NodeAddr, SimNetwork, TransportBuilder};
///
/// let network = SimNetwork::new();
/// let mut transport = TransportBuilder::new()
///     .max_frame_size(10)
///     .peer(NodeAddr(2))
///     .build(network.attach(NodeAddr(1)))?;
///
/// let sent = transport.send(b"HELLO")?;
/// ```
pub struct Transport<C> {
    channel: C,
    peer: NodeAddr,
    config: Config,
    sender: StopAndWaitSender,
    receiver: SliceReceiver,
}

impl<C: Channel> Transport<C> {
    /// Creates a transport sending to `peer` over `channel`.
    pub fn new(channel: C, peer: NodeAddr, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            channel,
            peer,
            sender: StopAndWaitSender::new(&config),
            receiver: SliceReceiver::new(&config),
            config,
        })
    }

    /// Creates a transport with default configuration.
    pub fn with_defaults(channel: C, peer: NodeAddr) -> Result<Self> {
        Self::new(channel, peer, Config::default())
    }

    /// Sends `payload` to the peer.
    ///
    /// Returns the number of bytes acknowledged, terminator included. A
    /// count below `payload.len() + 1` means a slice ran out of attempts.
    pub fn send(&mut self, payload: &[u8]) -> Result<usize> {
        self.sender.send(&mut self.channel, self.peer, payload)
    }

    /// Receives one message into `buf`.
    ///
    /// Returns the number of bytes written, terminator included, or `0`
    /// when the receive timed out.
    pub fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.receiver.receive(&mut self.channel, buf)
    }

    /// Receives one message into a new buffer, `None` on timeout.
    pub fn receive_message(&mut self) -> Result<Option<Vec<u8>>> {
        self.receiver.receive_message(&mut self.channel)
    }

    /// Returns the destination of `send`.
    pub fn peer(&self) -> NodeAddr {
        self.peer
    }

    /// Changes the destination of `send`.
    pub fn set_peer(&mut self, peer: NodeAddr) {
        self.peer = peer;
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a reference to the channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Returns a mutable reference to the channel.
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Consumes the transport and returns the channel.
    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Returns statistics of the last `send`.
    pub fn sender_stats(&self) -> SenderStats {
        *self.sender.stats()
    }

    /// Returns statistics of the last receive.
    pub fn receiver_stats(&self) -> ReceiverStats {
        *self.receiver.stats()
    }
}

/// Builder for creating Transport instances with custom configuration.
#[derive(Debug, Clone, Copy)]
pub struct TransportBuilder {
    config: Config,
    peer: NodeAddr,
}

impl TransportBuilder {
    /// Creates a new builder with default configuration and peer `node#0`.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            peer: NodeAddr::default(),
        }
    }

    /// Sets the payload bytes per frame.
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.config = self.config.with_max_frame_size(size);
        self
    }

    /// Sets the transmission attempts per slice.
    pub fn max_try(mut self, max_try: u32) -> Self {
        self.config = self.config.with_max_try(max_try);
        self
    }

    /// Sets the acknowledgment policy.
    pub fn ack_policy(mut self, policy: AckPolicy) -> Self {
        self.config = self.config.with_ack_policy(policy);
        self
    }

    /// Sets the destination of `send`.
    pub fn peer(mut self, peer: NodeAddr) -> Self {
        self.peer = peer;
        self
    }

    /// Builds the Transport instance.
    pub fn build<C: Channel>(self, channel: C) -> Result<Transport<C>> {
        Transport::new(channel, self.peer, self.config)
    }
}

impl Default for TransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
