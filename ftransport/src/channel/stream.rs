//! Frames over a byte stream.
//!
//! `StreamChannel` wraps anything implementing `std::io::{Read, Write}`
//! (Unix sockets, TCP, vsock) and carries each slice as a serialized header
//! followed by its payload. Incoming frames are demultiplexed by destination
//! mailbox; frames for a mailbox nobody is waiting on yet are parked until
//! asked for.
//!
//! A read timeout configured on the underlying socket surfaces as
//! `Ok(None)` from `receive`. A malformed header is reported once and its
//! buffered bytes are dropped.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};

use super::Channel;
use crate::core::{FrameHeader, MailboxId, NodeAddr, Slice, FRAME_HEADER_SIZE};
use crate::error::{Error, Result};

/// Read chunk size.
const READ_CHUNK: usize = 4096;

/// Channel carrying frames over a `std::io` byte stream.
#[derive(Debug)]
pub struct StreamChannel<T> {
    inner: T,
    local: NodeAddr,

    /// Bytes read but not yet parsed into a frame.
    inbox: Vec<u8>,

    /// Complete frames waiting for a `receive` on their mailbox.
    parked: VecDeque<Slice>,

    /// Serialization buffer for outgoing frames.
    frame_buf: Vec<u8>,
}

impl<T> StreamChannel<T> {
    /// Creates a channel for the node at `local` over `inner`.
    pub fn new(inner: T, local: NodeAddr) -> Self {
        Self {
            inner,
            local,
            inbox: Vec::new(),
            parked: VecDeque::new(),
            frame_buf: Vec::new(),
        }
    }

    /// Returns a reference to the inner stream.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Returns a mutable reference to the inner stream.
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consumes the channel and returns the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Returns the number of parked frames.
    pub fn parked(&self) -> usize {
        self.parked.len()
    }

    fn take_parked(&mut self, mailbox: MailboxId) -> Option<Slice> {
        let pos = self
            .parked
            .iter()
            .position(|s| s.header().dst_mailbox == mailbox)?;
        self.parked.remove(pos)
    }

    /// Parses one complete frame off the front of the inbox, if present.
    ///
    /// A header that fails to parse discards everything buffered, so the
    /// next call starts from whatever the stream delivers next.
    fn parse_frame(&mut self) -> Result<Option<Slice>> {
        if self.inbox.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let header = match FrameHeader::deserialize(&self.inbox) {
            Ok(header) => header,
            Err(e) => {
                log::warn!("Dropping {} unparsable bytes: {:?}", self.inbox.len(), e);
                self.inbox.clear();
                return Err(e);
            }
        };
        let total = FRAME_HEADER_SIZE + header.length as usize;
        if self.inbox.len() < total {
            return Ok(None);
        }

        let data = self.inbox[FRAME_HEADER_SIZE..total].to_vec();
        self.inbox.drain(..total);

        Slice::new(header, data).map(Some)
    }
}

impl<T: Read + Write> StreamChannel<T> {
    /// Reads more bytes into the inbox.
    ///
    /// Returns false when the read timed out.
    fn fill_inbox(&mut self) -> Result<bool> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => return Err(Error::ChannelClosed),
                Ok(n) => {
                    self.inbox.extend_from_slice(&chunk[..n]);
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Ok(false);
                }
                Err(e) => {
                    log::warn!("Stream read failed: {}", e);
                    return Err(Error::IoError);
                }
            }
        }
    }
}

impl<T: Read + Write> Channel for StreamChannel<T> {
    fn local_addr(&self) -> NodeAddr {
        self.local
    }

    fn send(&mut self, slice: &Slice) -> Result<()> {
        self.frame_buf.clear();
        self.frame_buf.resize(FRAME_HEADER_SIZE, 0);
        slice.header().serialize(&mut self.frame_buf)?;
        self.frame_buf.extend_from_slice(slice.data());

        self.inner
            .write_all(&self.frame_buf)
            .and_then(|_| self.inner.flush())
            .map_err(|e| {
                log::warn!("Stream write failed: {}", e);
                Error::IoError
            })?;

        log::trace!(
            "Sent frame {}/{} len={} to {} {}",
            slice.header().slice_index,
            slice.header().total_slices,
            slice.len(),
            slice.header().dst_addr,
            slice.header().dst_mailbox
        );
        Ok(())
    }

    fn receive(&mut self, mailbox: MailboxId) -> Result<Option<Slice>> {
        if let Some(slice) = self.take_parked(mailbox) {
            return Ok(Some(slice));
        }

        loop {
            while let Some(slice) = self.parse_frame()? {
                let header = *slice.header();
                if header.dst_addr != self.local {
                    log::warn!(
                        "Discarding frame for {} received at {}",
                        header.dst_addr,
                        self.local
                    );
                    continue;
                }
                if header.dst_mailbox == mailbox {
                    return Ok(Some(slice));
                }
                self.parked.push_back(slice);
            }

            if !self.fill_inbox()? {
                return Ok(None);
            }
        }
    }
}
