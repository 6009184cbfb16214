//! Frame header definition and serialization.
//!
//! Every slice travels with a header naming its route (node address and
//! mailbox at both ends) and its position inside the fragmented payload.
//!
//! # Header Format
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |    Version    |   Reserved    |     Source Address (hi)      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     Source Address (lo)       |  Destination Address (hi)    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  Destination Address (lo)     |        Source Mailbox        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      Destination Mailbox      |       Slice Index (hi)       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |       Slice Index (lo)        |       Total Slices (hi)      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |       Total Slices (lo)       |        Payload Length        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          Payload...                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! There is no checksum: payload bytes are trusted verbatim.

use core::fmt;

use crate::error::{Error, Result};
use crate::VERSION;

/// Frame header size in bytes.
pub const FRAME_HEADER_SIZE: usize = 24;

/// Mailbox receiving data slices.
pub const DATA_MAILBOX: MailboxId = MailboxId(0);

/// Mailbox receiving acknowledgments.
pub const ACK_MAILBOX: MailboxId = MailboxId(1);

/// Opaque address of a node on the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeAddr(pub u32);

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Logical sub-channel at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MailboxId(pub u16);

impl fmt::Display for MailboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mbox#{}", self.0)
    }
}

/// Routing and sequencing metadata carried by every slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Sending node.
    pub src_addr: NodeAddr,

    /// Receiving node.
    pub dst_addr: NodeAddr,

    /// Mailbox replies should go to.
    pub src_mailbox: MailboxId,

    /// Mailbox this frame is delivered to.
    pub dst_mailbox: MailboxId,

    /// Position of this slice in the payload (0-based).
    pub slice_index: u32,

    /// Number of slices the payload was cut into.
    pub total_slices: u32,

    /// Payload bytes carried by this frame.
    pub length: u16,
}

impl FrameHeader {
    /// Builds the header of an acknowledgment for `self`.
    ///
    /// Addresses and mailboxes are swapped so the reply routes back to the
    /// originator. An acknowledgment is always a one-slice message.
    pub fn reply(&self, length: u16) -> Self {
        Self {
            src_addr: self.dst_addr,
            dst_addr: self.src_addr,
            src_mailbox: self.dst_mailbox,
            dst_mailbox: self.src_mailbox,
            slice_index: 0,
            total_slices: 1,
            length,
        }
    }

    /// Returns true if this header names the final slice of its payload.
    pub const fn is_last_slice(&self) -> bool {
        self.total_slices > 0 && self.slice_index == self.total_slices - 1
    }

    /// Validates the sequencing fields.
    pub fn validate(&self) -> Result<()> {
        if self.total_slices == 0 || self.slice_index >= self.total_slices {
            return Err(Error::InvalidHeader);
        }
        Ok(())
    }

    /// Serializes the header into the first `FRAME_HEADER_SIZE` bytes of `buf`.
    pub fn serialize(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Err(Error::BufferTooSmall);
        }

        buf[0] = VERSION;
        buf[1] = 0; // Reserved
        buf[2..6].copy_from_slice(&self.src_addr.0.to_be_bytes());
        buf[6..10].copy_from_slice(&self.dst_addr.0.to_be_bytes());
        buf[10..12].copy_from_slice(&self.src_mailbox.0.to_be_bytes());
        buf[12..14].copy_from_slice(&self.dst_mailbox.0.to_be_bytes());
        buf[14..18].copy_from_slice(&self.slice_index.to_be_bytes());
        buf[18..22].copy_from_slice(&self.total_slices.to_be_bytes());
        buf[22..24].copy_from_slice(&self.length.to_be_bytes());

        Ok(FRAME_HEADER_SIZE)
    }

    /// Deserializes a header from the start of `buf`.
    pub fn deserialize(buf: &[u8]) -> Result<Self> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Err(Error::BufferTooSmall);
        }

        if buf[0] != VERSION {
            return Err(Error::VersionMismatch);
        }

        let header = Self {
            src_addr: NodeAddr(u32::from_be_bytes([buf[2], buf[3], buf[4], buf[5]])),
            dst_addr: NodeAddr(u32::from_be_bytes([buf[6], buf[7], buf[8], buf[9]])),
            src_mailbox: MailboxId(u16::from_be_bytes([buf[10], buf[11]])),
            dst_mailbox: MailboxId(u16::from_be_bytes([buf[12], buf[13]])),
            slice_index: u32::from_be_bytes([buf[14], buf[15], buf[16], buf[17]]),
            total_slices: u32::from_be_bytes([buf[18], buf[19], buf[20], buf[21]]),
            length: u16::from_be_bytes([buf[22], buf[23]]),
        };
        header.validate()?;

        Ok(header)
    }
}
