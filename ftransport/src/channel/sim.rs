//! In-memory mailbox network.
//!
//! A `SimNetwork` keeps one FIFO queue per `(node, mailbox)` pair. Every
//! node attached to the network gets a `SimChannel` handle; handles can be
//! moved to different threads so that two transports talk to each other
//! exactly as they would over a real link.
//!
//! Faults are injected with a loss filter that sees every frame header
//! before delivery and decides whether the frame is dropped.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::Channel;
use crate::core::{FrameHeader, MailboxId, NodeAddr, Slice};
use crate::error::{Error, Result};

type LossFilter = Box<dyn FnMut(&FrameHeader) -> bool + Send>;

/// Counters kept by the simulated network.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimStats {
    /// Frames queued for a mailbox.
    pub delivered: u64,

    /// Frames removed by the loss filter.
    pub dropped: u64,
}

#[derive(Default)]
struct NetState {
    queues: HashMap<(NodeAddr, MailboxId), VecDeque<Slice>>,
    trace: Vec<FrameHeader>,
    loss: Option<LossFilter>,
    stats: SimStats,
}

struct Shared {
    state: Mutex<NetState>,
    arrived: Condvar,
    recv_timeout: Option<Duration>,
}

impl Shared {
    fn lock(&self) -> Result<MutexGuard<'_, NetState>> {
        self.state.lock().map_err(|_| Error::IoError)
    }
}

/// Shared in-memory network. Cloning yields another handle to the same
/// network.
#[derive(Clone)]
pub struct SimNetwork {
    shared: Arc<Shared>,
}

impl SimNetwork {
    /// Creates a lossless network whose receives block until a frame arrives.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates a network whose receives give up after `timeout` without a
    /// frame.
    pub fn with_recv_timeout(timeout: Duration) -> Self {
        Self::build(Some(timeout))
    }

    fn build(recv_timeout: Option<Duration>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(NetState::default()),
                arrived: Condvar::new(),
                recv_timeout,
            }),
        }
    }

    /// Installs a loss filter. Frames for which it returns `true` are
    /// dropped.
    pub fn set_loss_filter<F>(&self, filter: F) -> Result<()>
    where
        F: FnMut(&FrameHeader) -> bool + Send + 'static,
    {
        self.shared.lock()?.loss = Some(Box::new(filter));
        Ok(())
    }

    /// Removes the loss filter.
    pub fn clear_loss_filter(&self) -> Result<()> {
        self.shared.lock()?.loss = None;
        Ok(())
    }

    /// Returns a channel handle for the node at `addr`.
    pub fn attach(&self, addr: NodeAddr) -> SimChannel {
        SimChannel {
            network: self.clone(),
            addr,
        }
    }

    /// Returns the headers of every frame sent so far, dropped ones
    /// included, in transmission order.
    pub fn trace(&self) -> Result<Vec<FrameHeader>> {
        Ok(self.shared.lock()?.trace.clone())
    }

    /// Returns delivery counters.
    pub fn stats(&self) -> Result<SimStats> {
        Ok(self.shared.lock()?.stats)
    }

    /// Returns the number of frames waiting in a mailbox.
    pub fn pending(&self, addr: NodeAddr, mailbox: MailboxId) -> Result<usize> {
        Ok(self
            .shared
            .lock()?
            .queues
            .get(&(addr, mailbox))
            .map_or(0, VecDeque::len))
    }

    fn deliver(&self, slice: &Slice) -> Result<()> {
        let header = *slice.header();
        let mut state = self.shared.lock()?;
        state.trace.push(header);

        let lost = match state.loss.as_mut() {
            Some(filter) => filter(&header),
            None => false,
        };
        if lost {
            state.stats.dropped += 1;
            log::trace!(
                "Dropped frame {}/{} to {} {}",
                header.slice_index,
                header.total_slices,
                header.dst_addr,
                header.dst_mailbox
            );
            return Ok(());
        }

        state
            .queues
            .entry((header.dst_addr, header.dst_mailbox))
            .or_default()
            .push_back(slice.clone());
        state.stats.delivered += 1;
        drop(state);

        self.shared.arrived.notify_all();
        Ok(())
    }

    fn take(&self, addr: NodeAddr, mailbox: MailboxId) -> Result<Option<Slice>> {
        let deadline = self.shared.recv_timeout.map(|t| Instant::now() + t);
        let mut state = self.shared.lock()?;

        loop {
            if let Some(slice) = state
                .queues
                .get_mut(&(addr, mailbox))
                .and_then(VecDeque::pop_front)
            {
                return Ok(Some(slice));
            }

            state = match deadline {
                None => self
                    .shared
                    .arrived
                    .wait(state)
                    .map_err(|_| Error::IoError)?,
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(None);
                    }
                    self.shared
                        .arrived
                        .wait_timeout(state, deadline - now)
                        .map_err(|_| Error::IoError)?
                        .0
                }
            };
        }
    }
}

impl Default for SimNetwork {
    fn default() -> Self {
        Self::new()
    }
}

/// One node's handle on a [`SimNetwork`].
#[derive(Clone)]
pub struct SimChannel {
    network: SimNetwork,
    addr: NodeAddr,
}

impl SimChannel {
    /// Returns the network this handle belongs to.
    pub fn network(&self) -> &SimNetwork {
        &self.network
    }
}

impl Channel for SimChannel {
    fn local_addr(&self) -> NodeAddr {
        self.addr
    }

    fn send(&mut self, slice: &Slice) -> Result<()> {
        self.network.deliver(slice)
    }

    fn receive(&mut self, mailbox: MailboxId) -> Result<Option<Slice>> {
        self.network.take(self.addr, mailbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ACK_MAILBOX, DATA_MAILBOX};
    use std::thread;

    fn slice_to(dst: NodeAddr, mailbox: MailboxId, data: &[u8]) -> Slice {
        let header = FrameHeader {
            src_addr: NodeAddr(1),
            dst_addr: dst,
            src_mailbox: ACK_MAILBOX,
            dst_mailbox: mailbox,
            slice_index: 0,
            total_slices: 1,
            length: data.len() as u16,
        };
        Slice::new(header, data.to_vec()).unwrap()
    }

    #[test]
    fn test_delivery_by_mailbox() {
        let network = SimNetwork::with_recv_timeout(Duration::from_millis(10));
        let mut a = network.attach(NodeAddr(1));
        let mut b = network.attach(NodeAddr(2));

        a.send(&slice_to(NodeAddr(2), DATA_MAILBOX, b"data")).unwrap();
        a.send(&slice_to(NodeAddr(2), ACK_MAILBOX, b"    0")).unwrap();

        let ack = b.receive(ACK_MAILBOX).unwrap().unwrap();
        assert_eq!(ack.data(), b"    0");
        let data = b.receive(DATA_MAILBOX).unwrap().unwrap();
        assert_eq!(data.data(), b"data");

        assert!(b.receive(DATA_MAILBOX).unwrap().is_none());
        assert!(a.receive(DATA_MAILBOX).unwrap().is_none());
    }

    #[test]
    fn test_fifo_per_mailbox() {
        let network = SimNetwork::with_recv_timeout(Duration::from_millis(10));
        let mut a = network.attach(NodeAddr(1));
        let mut b = network.attach(NodeAddr(2));

        for byte in b"xyz" {
            a.send(&slice_to(NodeAddr(2), DATA_MAILBOX, &[*byte])).unwrap();
        }
        assert_eq!(network.pending(NodeAddr(2), DATA_MAILBOX).unwrap(), 3);

        for byte in b"xyz" {
            let slice = b.receive(DATA_MAILBOX).unwrap().unwrap();
            assert_eq!(slice.data(), &[*byte]);
        }
    }

    #[test]
    fn test_loss_filter() {
        let network = SimNetwork::with_recv_timeout(Duration::from_millis(10));
        let mut a = network.attach(NodeAddr(1));
        let mut b = network.attach(NodeAddr(2));

        let mut seen = 0;
        network
            .set_loss_filter(move |_| {
                seen += 1;
                seen % 2 == 1
            })
            .unwrap();

        a.send(&slice_to(NodeAddr(2), DATA_MAILBOX, b"1")).unwrap();
        a.send(&slice_to(NodeAddr(2), DATA_MAILBOX, b"2")).unwrap();

        assert_eq!(b.receive(DATA_MAILBOX).unwrap().unwrap().data(), b"2");
        assert!(b.receive(DATA_MAILBOX).unwrap().is_none());

        let stats = network.stats().unwrap();
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(network.trace().unwrap().len(), 2);
    }

    #[test]
    fn test_blocking_receive_wakes_up() {
        let network = SimNetwork::new();
        let mut a = network.attach(NodeAddr(1));
        let mut b = network.attach(NodeAddr(2));

        let handle = thread::spawn(move || b.receive(DATA_MAILBOX).unwrap().unwrap());

        thread::sleep(Duration::from_millis(20));
        a.send(&slice_to(NodeAddr(2), DATA_MAILBOX, b"late")).unwrap();

        let slice = handle.join().unwrap();
        assert_eq!(slice.data(), b"late");
    }
}
