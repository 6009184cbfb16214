//! Sending side: fragmentation and the stop-and-wait retry loop.
//!
//! Slices go out strictly in order. After each transmission the sender
//! blocks on its acknowledgment mailbox; only an acknowledgment naming the
//! slice just sent lets it move on. Anything else (a stale index, garbled
//! text, the channel giving up) costs one attempt and triggers a
//! retransmission of the same slice.

use crate::channel::Channel;
use crate::config::Config;
use crate::core::{decode_ack, FrameHeader, NodeAddr, Slice, SlicePlan, ACK_MAILBOX, DATA_MAILBOX};
use crate::error::{Error, Result};

/// Statistics about the last `send` call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SenderStats {
    /// Data frames handed to the channel, retransmissions included.
    pub frames_sent: u64,

    /// Transmissions beyond the first for a slice.
    pub retransmissions: u64,

    /// Acknowledgments naming the slice in flight.
    pub acks_matched: u64,

    /// Acknowledgments naming another slice, or unreadable.
    pub acks_mismatched: u64,

    /// Waits that ended without any acknowledgment.
    pub ack_timeouts: u64,

    /// Slices confirmed by the receiver.
    pub slices_acked: u64,

    /// Whether the send stopped on an exhausted retry budget.
    pub exhausted: bool,
}

impl SenderStats {
    /// Creates new empty statistics.
    pub const fn new() -> Self {
        Self {
            frames_sent: 0,
            retransmissions: 0,
            acks_matched: 0,
            acks_mismatched: 0,
            ack_timeouts: 0,
            slices_acked: 0,
            exhausted: false,
        }
    }

    /// Returns the retransmission rate as a percentage.
    pub fn retransmit_rate(&self) -> f32 {
        if self.frames_sent == 0 {
            0.0
        } else {
            (self.retransmissions as f32 / self.frames_sent as f32) * 100.0
        }
    }
}

/// Stop-and-wait sender.
///
/// Holds no state between calls other than the statistics of the last
/// `send`.
#[derive(Debug)]
pub struct StopAndWaitSender {
    config: Config,
    stats: SenderStats,
}

impl StopAndWaitSender {
    /// Creates a new sender with the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            config: *config,
            stats: SenderStats::new(),
        }
    }

    /// Returns statistics of the last `send`.
    pub fn stats(&self) -> &SenderStats {
        &self.stats
    }

    /// Sends `payload` plus its terminator to the data mailbox of `peer`.
    ///
    /// Returns the bytes carried by acknowledged slices. The count is short
    /// of `payload.len() + 1` when a slice ran out of attempts; that slice
    /// and everything after it were never confirmed.
    pub fn send<C: Channel>(
        &mut self,
        channel: &mut C,
        peer: NodeAddr,
        payload: &[u8],
    ) -> Result<usize> {
        self.config.validate()?;
        self.stats = SenderStats::new();

        let plan = SlicePlan::new(payload.len(), self.config.max_frame_size)?;
        let total_slices = plan.total_slices();
        let local = channel.local_addr();

        log::debug!(
            "Sending {} bytes to {} in {} slices",
            plan.wire_len(),
            peer,
            total_slices
        );

        let mut bytes_sent = 0;
        for index in 0..total_slices {
            let data = plan
                .slice_bytes(payload, index)
                .ok_or(Error::InvalidHeader)?;
            let header = FrameHeader {
                src_addr: local,
                dst_addr: peer,
                src_mailbox: ACK_MAILBOX,
                dst_mailbox: DATA_MAILBOX,
                slice_index: index,
                total_slices,
                length: data.len() as u16,
            };
            let slice = Slice::new(header, data)?;

            if !self.deliver(channel, &slice)? {
                self.stats.exhausted = true;
                log::warn!(
                    "Slice {}/{} unacknowledged after {} attempts, {} bytes confirmed",
                    index,
                    total_slices,
                    self.config.max_try,
                    bytes_sent
                );
                return Ok(bytes_sent);
            }

            bytes_sent += slice.len();
            self.stats.slices_acked += 1;
        }

        log::debug!("Sent {} bytes to {}", bytes_sent, peer);
        Ok(bytes_sent)
    }

    /// Transmits one slice until it is acknowledged or out of attempts.
    ///
    /// Returns true once acknowledged.
    fn deliver<C: Channel>(&mut self, channel: &mut C, slice: &Slice) -> Result<bool> {
        let index = slice.header().slice_index;

        for attempt in 1..=self.config.max_try {
            if attempt > 1 {
                self.stats.retransmissions += 1;
                log::debug!(
                    "No response for slice {}, sending again ({}/{})",
                    index,
                    attempt,
                    self.config.max_try
                );
            }

            channel.send(slice)?;
            self.stats.frames_sent += 1;

            match channel.receive(ACK_MAILBOX)? {
                None => self.stats.ack_timeouts += 1,
                Some(ack) => match decode_ack(ack.data()) {
                    Some(acked) if acked == index as i64 => {
                        self.stats.acks_matched += 1;
                        log::trace!("Slice {} acknowledged", index);
                        return Ok(true);
                    }
                    acked => {
                        self.stats.acks_mismatched += 1;
                        log::debug!("Wrong ack {:?} while waiting for slice {}", acked, index);
                    }
                },
            }
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::mock::{ack_for, ScriptedChannel};
    use crate::core::TERMINATOR;
    use crate::MAX_SLICES;

    const LOCAL: NodeAddr = NodeAddr(1);
    const PEER: NodeAddr = NodeAddr(2);

    fn config(max_frame_size: usize, max_try: u32) -> Config {
        Config::new()
            .with_max_frame_size(max_frame_size)
            .with_max_try(max_try)
    }

    /// A peer that acknowledges every data slice with its own index.
    fn echo_peer() -> ScriptedChannel {
        ScriptedChannel::new(LOCAL).with_responder(|slice| {
            std::vec![ack_for(slice, slice.header().slice_index as i64)]
        })
    }

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| b'a' + (i % 26) as u8).collect()
    }

    #[test]
    fn test_single_slice_message() {
        let mut channel = echo_peer();
        let mut sender = StopAndWaitSender::new(&config(10, 3));

        let sent = sender.send(&mut channel, PEER, b"HELLO").unwrap();
        assert_eq!(sent, 6);

        assert_eq!(channel.sent.len(), 1);
        let slice = &channel.sent[0];
        assert_eq!(slice.data(), b"HELLO\0");
        assert_eq!(slice.header().slice_index, 0);
        assert_eq!(slice.header().total_slices, 1);
        assert_eq!(slice.header().src_addr, LOCAL);
        assert_eq!(slice.header().dst_addr, PEER);
        assert_eq!(slice.header().dst_mailbox, DATA_MAILBOX);
        assert_eq!(slice.header().src_mailbox, ACK_MAILBOX);
        assert_eq!(sender.stats().acks_matched, 1);
    }

    #[test]
    fn test_three_slices_in_order() {
        let mut channel = echo_peer();
        let mut sender = StopAndWaitSender::new(&config(10, 3));
        let data = payload(24);

        let sent = sender.send(&mut channel, PEER, &data).unwrap();
        assert_eq!(sent, 25);

        let headers = channel.sent_headers();
        let indices: Vec<u32> = headers.iter().map(|h| h.slice_index).collect();
        let lengths: Vec<u16> = headers.iter().map(|h| h.length).collect();
        assert_eq!(indices, [0, 1, 2]);
        assert_eq!(lengths, [10, 10, 5]);
        assert!(headers.iter().all(|h| h.total_slices == 3));
        assert_eq!(channel.sent[2].data().last(), Some(&TERMINATOR));
    }

    #[test]
    fn test_retry_exhaustion_counts_confirmed_slices_only() {
        // Slice 1 is always answered with a stale index.
        let mut channel = ScriptedChannel::new(LOCAL).with_responder(|slice| {
            let index = slice.header().slice_index as i64;
            let acked = if index == 1 { 0 } else { index };
            std::vec![ack_for(slice, acked)]
        });
        let mut sender = StopAndWaitSender::new(&config(10, 3));

        let sent = sender.send(&mut channel, PEER, &payload(24)).unwrap();
        assert_eq!(sent, 10);

        let indices: Vec<u32> = channel.sent_headers().iter().map(|h| h.slice_index).collect();
        assert_eq!(indices, [0, 1, 1, 1]);

        let stats = sender.stats();
        assert!(stats.exhausted);
        assert_eq!(stats.frames_sent, 4);
        assert_eq!(stats.retransmissions, 2);
        assert_eq!(stats.acks_mismatched, 3);
        assert_eq!(stats.slices_acked, 1);
    }

    #[test]
    fn test_silent_peer() {
        let mut channel = ScriptedChannel::new(LOCAL);
        let mut sender = StopAndWaitSender::new(&config(10, 4));

        let sent = sender.send(&mut channel, PEER, b"HELLO").unwrap();
        assert_eq!(sent, 0);
        assert_eq!(channel.sent.len(), 4);
        assert_eq!(sender.stats().ack_timeouts, 4);
    }

    #[test]
    fn test_stop_and_wait_after_lost_acks() {
        // The first transmission of every slice goes unanswered.
        let mut answered = std::collections::HashSet::new();
        let mut channel = ScriptedChannel::new(LOCAL).with_responder(move |slice| {
            let index = slice.header().slice_index;
            if answered.insert(index) {
                Vec::new()
            } else {
                std::vec![ack_for(slice, index as i64)]
            }
        });
        let mut sender = StopAndWaitSender::new(&config(10, 3));

        let sent = sender.send(&mut channel, PEER, &payload(24)).unwrap();
        assert_eq!(sent, 25);

        let indices: Vec<u32> = channel.sent_headers().iter().map(|h| h.slice_index).collect();
        assert_eq!(indices, [0, 0, 1, 1, 2, 2]);
        assert_eq!(sender.stats().retransmissions, 3);
    }

    #[test]
    fn test_garbled_ack_is_not_a_confirmation() {
        let mut first = true;
        let mut channel = ScriptedChannel::new(LOCAL).with_responder(move |slice| {
            let mut ack = ack_for(slice, 0);
            if first {
                first = false;
                let header = *ack.header();
                ack = Slice::new(header, b"zzzzz".to_vec()).unwrap();
            }
            std::vec![ack]
        });
        let mut sender = StopAndWaitSender::new(&config(10, 3));

        assert_eq!(sender.send(&mut channel, PEER, b"HELLO").unwrap(), 6);
        assert_eq!(channel.sent.len(), 2);
        assert_eq!(sender.stats().acks_mismatched, 1);
    }

    #[test]
    fn test_payload_needing_too_many_slices() {
        let mut channel = echo_peer();
        let mut sender = StopAndWaitSender::new(&config(5, 3));
        let data = std::vec![0u8; MAX_SLICES as usize * 5];

        assert_eq!(
            sender.send(&mut channel, PEER, &data),
            Err(Error::PayloadTooLarge)
        );
        assert!(channel.sent.is_empty());
    }

    #[test]
    fn test_invalid_config() {
        let mut channel = echo_peer();
        let mut sender = StopAndWaitSender::new(&config(10, 0));

        assert_eq!(
            sender.send(&mut channel, PEER, b"x"),
            Err(Error::InvalidConfig)
        );
    }
}
