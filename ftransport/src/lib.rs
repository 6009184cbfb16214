//! # FTransport - A Stop-and-Wait Fragmented Transport
//!
//! FTransport is a `no_std` compatible transport layer that delivers an
//! arbitrary-length payload over a channel that only moves bounded-size,
//! unordered, possibly-lost frames between mailboxes:
//!
//! - **Fragmentation**: payloads are cut into slices of at most `max_frame_size` bytes
//! - **Stop-and-wait**: exactly one slice is in flight until it is acknowledged
//! - **Bounded retry**: each slice is retransmitted at most `max_try` times
//! - **In-order reassembly**: the receiver only accepts the next contiguous slice
//! - **Custom channel support**: works with any substrate implementing [`Channel`]
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Application Layer                     │
//! ├─────────────────────────────────────────────────────────┤
//! │                    Transport                             │
//! │  ┌──────────────────┐        ┌──────────────────────┐   │
//! │  │ StopAndWaitSender│        │ SliceReceiver        │   │
//! │  │  (fragment+retry)│        │  (reassemble+ack)    │   │
//! │  └──────────────────┘        └──────────────────────┘   │
//! ├─────────────────────────────────────────────────────────┤
//! │                    Frame Layer                           │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────┐   │
//! │  │ FrameHeader │ │   Slice     │ │   Ack text      │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────┘   │
//! ├─────────────────────────────────────────────────────────┤
//! │                    Channel (mailboxes)                   │
//! │  ┌─────────────────────┐ ┌─────────────────────────┐   │
//! │  │ SimNetwork (memory) │ │ StreamChannel (sockets) │   │
//! │  └─────────────────────┘ └─────────────────────────┘   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use ftransport::{Config, NodeAddr, Transport};
//!
//! let mut transport = Transport::new(channel, NodeAddr(2), Config::default())?;
//!
//! // Send data (a terminating zero byte is appended on the wire)
//! let sent = transport.send(b"Hello, World!")?;
//!
//! // Receive data on the peer
//! let mut buf = [0u8; 1024];
//! let n = transport.receive(&mut buf)?;
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

pub mod channel;
pub mod config;
pub mod core;
pub mod error;
pub mod reliable;
pub mod transport;

// Re-export commonly used types
pub use crate::core::{
    FrameHeader, MailboxId, NodeAddr, Slice, ACK_MAILBOX, DATA_MAILBOX, FRAME_HEADER_SIZE,
};
pub use channel::Channel;
pub use config::{AckPolicy, Config};
pub use error::{Error, Result};
pub use reliable::{ReceiverStats, SenderStats};
pub use transport::{Transport, TransportBuilder};

#[cfg(feature = "std")]
pub use channel::{SimChannel, SimNetwork, StreamChannel};

/// Protocol version
pub const VERSION: u8 = 1;

/// Default payload capacity of one frame, in bytes
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64;

/// Default transmission attempts per slice
pub const DEFAULT_MAX_TRY: u32 = 5;

/// Width of the decimal text carried by an acknowledgment frame
pub const ACK_WIDTH: usize = 5;

/// Largest slice count whose indices fit the acknowledgment text
pub const MAX_SLICES: u32 = 99_999;
