//! Reliable delivery over a lossy channel.
//!
//! This module provides both halves of the stop-and-wait protocol:
//! - StopAndWaitSender: Fragmentation and per-slice retransmission
//! - SliceReceiver: In-sequence acceptance with one acknowledgment per frame
//! - Reassembler: Ordered slot storage for accepted slices

mod reassembler;
mod receiver;
mod sender;

pub use reassembler::{Disposition, Reassembler};
pub use receiver::{ReceiverStats, SliceReceiver};
pub use sender::{SenderStats, StopAndWaitSender};
