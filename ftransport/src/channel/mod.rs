//! Channel abstraction.
//!
//! This module provides the `Channel` trait that lets the transport run over
//! any frame-moving substrate: a simulated network, a socket, a serial
//! link. A channel moves whole slices between mailboxes; it may lose or
//! reorder them and it never acknowledges anything itself.
//!
//! # Implementations
//!
//! - `SimNetwork` / `SimChannel`: In-memory mailbox network with optional
//!   loss filter and receive timeout (requires `std` feature)
//! - `StreamChannel`: Frames over any `std::io` byte stream (requires `std`
//!   feature)

use crate::core::{MailboxId, NodeAddr, Slice};
use crate::error::Result;

#[cfg(feature = "std")]
mod sim;
#[cfg(feature = "std")]
mod stream;

#[cfg(test)]
pub(crate) mod mock;

#[cfg(feature = "std")]
pub use sim::{SimChannel, SimNetwork, SimStats};
#[cfg(feature = "std")]
pub use stream::StreamChannel;

/// Frame-level channel between mailboxes.
///
/// Implement this trait to run the transport over a custom substrate.
pub trait Channel {
    /// Returns the address stamped as source on outgoing frames.
    fn local_addr(&self) -> NodeAddr;

    /// Sends one slice to `slice.header().dst_addr`.
    ///
    /// Fire-and-forget: success says nothing about delivery. Errors are
    /// reserved for local failures of the underlying medium.
    fn send(&mut self, slice: &Slice) -> Result<()>;

    /// Blocks until a slice addressed to `mailbox` at this node arrives.
    ///
    /// Returns `Ok(None)` when the channel gives up waiting (a socket read
    /// timeout, an empty scripted queue). Callers count that as one failed
    /// attempt.
    fn receive(&mut self, mailbox: MailboxId) -> Result<Option<Slice>>;
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn local_addr(&self) -> NodeAddr {
        (**self).local_addr()
    }

    fn send(&mut self, slice: &Slice) -> Result<()> {
        (**self).send(slice)
    }

    fn receive(&mut self, mailbox: MailboxId) -> Result<Option<Slice>> {
        (**self).receive(mailbox)
    }
}
