//! Core data structures shared by both ends of the transport.
//!
//! This module contains the fundamental building blocks:
//! - Frame: header layout, addressing and wire serialization
//! - Slice: immutable payload chunk and the fragmentation plan
//! - Ack: fixed-width acknowledgment text

mod ack;
mod frame;
mod slice;

pub use ack::{decode_ack, encode_ack, AckText, NOTHING_ACCEPTED};
pub use frame::{FrameHeader, MailboxId, NodeAddr, ACK_MAILBOX, DATA_MAILBOX, FRAME_HEADER_SIZE};
pub use slice::{Slice, SlicePlan, TERMINATOR};
