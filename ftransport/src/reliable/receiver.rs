//! Receiving side: in-sequence acceptance and acknowledgment.
//!
//! Every data frame that arrives is answered with one acknowledgment,
//! whatever happens to the frame itself. Frames announcing more than
//! `MAX_SLICES` slices are never stored, and go unanswered only when the
//! index to acknowledge does not fit the acknowledgment text. The receive
//! ends as soon as a frame carrying the final index has been processed, or
//! fails after `max_try * total_slices` iterations.

use alloc::vec::Vec;

use super::reassembler::{Disposition, Reassembler};
use crate::channel::Channel;
use crate::config::{AckPolicy, Config};
use crate::core::{encode_ack, FrameHeader, Slice, DATA_MAILBOX};
use crate::error::Result;
use crate::MAX_SLICES;

/// Statistics about the last receive call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Data frames taken from the channel.
    pub frames_received: u64,

    /// Frames stored as the next slice in sequence.
    pub accepted: u64,

    /// Frames carrying an index already accepted.
    pub duplicates: u64,

    /// Frames carrying an index beyond the next expected one.
    pub out_of_order: u64,

    /// Acknowledgments sent.
    pub acks_sent: u64,

    /// Whether the receive gave up without seeing the final slice.
    pub timed_out: bool,
}

impl ReceiverStats {
    /// Creates new empty statistics.
    pub const fn new() -> Self {
        Self {
            frames_received: 0,
            accepted: 0,
            duplicates: 0,
            out_of_order: 0,
            acks_sent: 0,
            timed_out: false,
        }
    }
}

/// Receiver of one message per call.
#[derive(Debug)]
pub struct SliceReceiver {
    config: Config,
    stats: ReceiverStats,
}

impl SliceReceiver {
    /// Creates a new receiver with the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            config: *config,
            stats: ReceiverStats::new(),
        }
    }

    /// Returns statistics of the last receive.
    pub fn stats(&self) -> &ReceiverStats {
        &self.stats
    }

    /// Receives one message into `buf`.
    ///
    /// Returns the number of bytes written, terminator included. `Ok(0)`
    /// means the receive timed out and partial data was discarded.
    pub fn receive<C: Channel>(&mut self, channel: &mut C, buf: &mut [u8]) -> Result<usize> {
        match self.collect(channel)? {
            Some(mut reassembler) => reassembler.drain_into(buf),
            None => Ok(0),
        }
    }

    /// Receives one message into a freshly allocated buffer.
    ///
    /// Returns `None` on timeout.
    pub fn receive_message<C: Channel>(&mut self, channel: &mut C) -> Result<Option<Vec<u8>>> {
        Ok(self.collect(channel)?.map(Reassembler::into_bytes))
    }

    fn collect<C: Channel>(&mut self, channel: &mut C) -> Result<Option<Reassembler>> {
        self.config.validate()?;
        self.stats = ReceiverStats::new();

        let mut reassembler = Reassembler::new();
        let mut total_slices = 1u32;
        let mut iterations = 0u64;

        loop {
            iterations += 1;

            if let Some(slice) = channel.receive(DATA_MAILBOX)? {
                let header = *slice.header();
                self.stats.frames_received += 1;

                if header.total_slices > MAX_SLICES {
                    // Not stored, but still acknowledged when the index fits
                    // the acknowledgment text.
                    log::warn!(
                        "Ignoring frame from {} announcing {} slices",
                        header.src_addr,
                        header.total_slices
                    );
                    let acked = self.ack_index(&header, &reassembler);
                    if acked <= MAX_SLICES as i64 {
                        self.acknowledge(channel, &header, acked)?;
                    }
                } else {
                    total_slices = header.total_slices;

                    let disposition = reassembler.offer(slice);
                    match disposition {
                        Disposition::Accepted => self.stats.accepted += 1,
                        Disposition::Duplicate => self.stats.duplicates += 1,
                        Disposition::OutOfOrder => self.stats.out_of_order += 1,
                    }
                    log::trace!(
                        "Slice {}/{} from {}: {:?}",
                        header.slice_index,
                        header.total_slices,
                        header.src_addr,
                        disposition
                    );

                    let acked = self.ack_index(&header, &reassembler);
                    self.acknowledge(channel, &header, acked)?;

                    if header.is_last_slice() {
                        log::debug!(
                            "Received {} bytes in {} slices from {}",
                            reassembler.received_bytes(),
                            reassembler.accepted(),
                            header.src_addr
                        );
                        return Ok(Some(reassembler));
                    }
                }
            }

            if iterations >= self.config.max_try as u64 * total_slices as u64 {
                self.stats.timed_out = true;
                log::warn!(
                    "Receive timed out after {} iterations, {} of {} slices accepted",
                    iterations,
                    reassembler.accepted(),
                    total_slices
                );
                return Ok(None);
            }
        }
    }

    /// Index carried by the acknowledgment for `data`.
    fn ack_index(&self, data: &FrameHeader, reassembler: &Reassembler) -> i64 {
        match self.config.ack_policy {
            AckPolicy::EchoReceived => data.slice_index as i64,
            AckPolicy::HighestAccepted => reassembler.last_accepted(),
        }
    }

    fn acknowledge<C: Channel>(
        &mut self,
        channel: &mut C,
        data: &FrameHeader,
        index: i64,
    ) -> Result<()> {
        let text = encode_ack(index)?;
        let header = data.reply(text.len() as u16);
        let ack = Slice::new(header, text.as_bytes().to_vec())?;
        channel.send(&ack)?;
        self.stats.acks_sent += 1;
        Ok(())
    }
}
