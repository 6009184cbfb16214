//! In-sequence slice reassembly.
//!
//! Slices are accepted strictly in index order. Slots are pre-sized from
//! the `total_slices` of the first frame, so placement is a direct index
//! and draining walks the slots in ascending order.

use alloc::vec::Vec;

use crate::core::{Slice, NOTHING_ACCEPTED};
use crate::error::{Error, Result};
use crate::MAX_SLICES;

/// What the reassembler did with an offered slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The slice was the next one expected and has been stored.
    Accepted,

    /// The slice was already accepted earlier.
    Duplicate,

    /// The slice lies beyond the next expected index.
    OutOfOrder,
}

/// Collects slices of one message in order.
#[derive(Debug)]
pub struct Reassembler {
    slots: Vec<Option<Slice>>,
    last_accepted: i64,
    received_bytes: usize,
}

impl Reassembler {
    /// Creates an empty reassembler.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            last_accepted: NOTHING_ACCEPTED,
            received_bytes: 0,
        }
    }

    /// Highest index accepted so far, or `-1`.
    pub fn last_accepted(&self) -> i64 {
        self.last_accepted
    }

    /// Total payload bytes of accepted slices.
    pub fn received_bytes(&self) -> usize {
        self.received_bytes
    }

    /// Number of accepted slices.
    pub fn accepted(&self) -> usize {
        (self.last_accepted + 1) as usize
    }

    /// Offers a slice. Only `last_accepted + 1` is stored.
    pub fn offer(&mut self, slice: Slice) -> Disposition {
        let index = slice.header().slice_index as i64;
        let expected = self.last_accepted + 1;

        if index < expected {
            return Disposition::Duplicate;
        }
        if index > expected {
            return Disposition::OutOfOrder;
        }

        let slot = index as usize;
        if self.slots.len() <= slot {
            let total = slice.header().total_slices.min(MAX_SLICES) as usize;
            self.slots.resize_with(total.max(slot + 1), || None);
        }

        self.received_bytes += slice.len();
        self.slots[slot] = Some(slice);
        self.last_accepted = index;
        Disposition::Accepted
    }

    /// Copies accepted slices in index order into `buf`.
    ///
    /// Returns the number of bytes written; fails without writing when `buf`
    /// cannot hold them all.
    pub fn drain_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < self.received_bytes {
            return Err(Error::BufferTooSmall);
        }

        let mut offset = 0;
        for slice in self.slots.drain(..).flatten() {
            let end = offset + slice.len();
            buf[offset..end].copy_from_slice(slice.data());
            offset = end;
        }

        self.last_accepted = NOTHING_ACCEPTED;
        self.received_bytes = 0;
        Ok(offset)
    }

    /// Consumes the reassembler and returns the accepted bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.received_bytes);
        for slice in self.slots.into_iter().flatten() {
            bytes.extend_from_slice(slice.data());
        }
        bytes
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}
