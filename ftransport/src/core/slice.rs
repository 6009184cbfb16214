//! Slices and payload fragmentation.
//!
//! A payload always travels with one implicit terminating zero byte, so a
//! payload of `L` bytes occupies `L + 1` bytes on the wire and is cut into
//! `ceil((L + 1) / max_frame_size)` slices.

use alloc::vec::Vec;
use core::ops::Range;

use super::frame::FrameHeader;
use crate::error::{Error, Result};
use crate::MAX_SLICES;

/// Byte appended to every payload before fragmentation.
pub const TERMINATOR: u8 = 0;

/// One bounded-size chunk of a payload together with its header.
///
/// Slices are immutable once constructed; the payload length always equals
/// `header.length`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    header: FrameHeader,
    data: Vec<u8>,
}

impl Slice {
    /// Pairs a header with its payload bytes.
    pub fn new(header: FrameHeader, data: Vec<u8>) -> Result<Self> {
        if data.len() != header.length as usize {
            return Err(Error::InvalidFrame);
        }
        header.validate()?;

        Ok(Self { header, data })
    }

    /// Returns the header.
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Returns the payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of payload bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the slice carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consumes the slice and returns its payload.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// How a payload is cut into slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlicePlan {
    /// Bytes on the wire, terminator included.
    wire_len: usize,

    /// Payload capacity of one frame.
    max_frame_size: usize,
}

impl SlicePlan {
    /// Plans the fragmentation of a payload of `payload_len` bytes.
    pub fn new(payload_len: usize, max_frame_size: usize) -> Result<Self> {
        if max_frame_size == 0 {
            return Err(Error::InvalidConfig);
        }

        let plan = Self {
            wire_len: payload_len + 1,
            max_frame_size,
        };
        if plan.total_slices_usize() > MAX_SLICES as usize {
            return Err(Error::PayloadTooLarge);
        }

        Ok(plan)
    }

    fn total_slices_usize(&self) -> usize {
        self.wire_len.div_ceil(self.max_frame_size)
    }

    /// Returns the number of slices.
    pub fn total_slices(&self) -> u32 {
        self.total_slices_usize() as u32
    }

    /// Returns the bytes on the wire, terminator included.
    pub const fn wire_len(&self) -> usize {
        self.wire_len
    }

    /// Returns the wire byte range covered by slice `index`.
    pub fn range(&self, index: u32) -> Option<Range<usize>> {
        if index >= self.total_slices() {
            return None;
        }

        let start = index as usize * self.max_frame_size;
        let end = core::cmp::min(start + self.max_frame_size, self.wire_len);
        Some(start..end)
    }

    /// Returns the length of slice `index`.
    ///
    /// Every slice but the last is full; the last carries the remainder, or a
    /// full frame when the wire length is an exact multiple.
    pub fn slice_len(&self, index: u32) -> Option<usize> {
        self.range(index).map(|range| range.len())
    }

    /// Copies the bytes of slice `index` out of `payload`, appending the
    /// terminator when the slice reaches the end of the wire data.
    pub fn slice_bytes(&self, payload: &[u8], index: u32) -> Option<Vec<u8>> {
        let range = self.range(index)?;
        let mut bytes = Vec::with_capacity(range.len());

        let data_end = core::cmp::min(range.end, payload.len());
        if range.start < data_end {
            bytes.extend_from_slice(&payload[range.start..data_end]);
        }
        if range.end == self.wire_len {
            bytes.push(TERMINATOR);
        }

        Some(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NodeAddr, ACK_MAILBOX, DATA_MAILBOX};

    fn header(length: u16) -> FrameHeader {
        FrameHeader {
            src_addr: NodeAddr(1),
            dst_addr: NodeAddr(2),
            src_mailbox: ACK_MAILBOX,
            dst_mailbox: DATA_MAILBOX,
            slice_index: 0,
            total_slices: 1,
            length,
        }
    }

    #[test]
    fn test_slice_count_includes_terminator() {
        // ceil((L + 1) / 10)
        assert_eq!(SlicePlan::new(0, 10).unwrap().total_slices(), 1);
        assert_eq!(SlicePlan::new(5, 10).unwrap().total_slices(), 1);
        assert_eq!(SlicePlan::new(9, 10).unwrap().total_slices(), 1);
        assert_eq!(SlicePlan::new(10, 10).unwrap().total_slices(), 2);
        assert_eq!(SlicePlan::new(24, 10).unwrap().total_slices(), 3);
        assert_eq!(SlicePlan::new(29, 10).unwrap().total_slices(), 3);
    }

    #[test]
    fn test_slice_lengths_sum_to_wire_len() {
        for payload_len in 0..64 {
            let plan = SlicePlan::new(payload_len, 7).unwrap();
            let sum: usize = (0..plan.total_slices())
                .map(|i| plan.slice_len(i).unwrap())
                .sum();
            assert_eq!(sum, payload_len + 1);
        }
    }

    #[test]
    fn test_last_slice_is_full_on_exact_multiple() {
        // 19 payload bytes + terminator = 20 = 2 * 10
        let plan = SlicePlan::new(19, 10).unwrap();
        assert_eq!(plan.total_slices(), 2);
        assert_eq!(plan.slice_len(0), Some(10));
        assert_eq!(plan.slice_len(1), Some(10));
        assert_eq!(plan.slice_len(2), None);
    }

    #[test]
    fn test_slice_bytes() {
        let payload: Vec<u8> = (1..=24).collect();
        let plan = SlicePlan::new(payload.len(), 10).unwrap();

        let first = plan.slice_bytes(&payload, 0).unwrap();
        assert_eq!(first, (1..=10).collect::<Vec<u8>>());

        let last = plan.slice_bytes(&payload, 2).unwrap();
        assert_eq!(last, [21, 22, 23, 24, TERMINATOR]);

        assert!(plan.slice_bytes(&payload, 3).is_none());
    }

    #[test]
    fn test_terminator_alone_in_last_slice() {
        let payload = [b'x'; 10];
        let plan = SlicePlan::new(payload.len(), 10).unwrap();

        assert_eq!(plan.slice_bytes(&payload, 1).unwrap(), [TERMINATOR]);
    }

    #[test]
    fn test_too_many_slices() {
        let result = SlicePlan::new(MAX_SLICES as usize * 5, 5);
        assert_eq!(result, Err(Error::PayloadTooLarge));
    }

    #[test]
    fn test_slice_length_must_match_header() {
        assert!(Slice::new(header(3), b"abc".to_vec()).is_ok());
        assert_eq!(Slice::new(header(4), b"abc".to_vec()), Err(Error::InvalidFrame));
    }
}
