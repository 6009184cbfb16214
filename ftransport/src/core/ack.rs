//! Acknowledgment payload encoding.
//!
//! An acknowledgment carries one slice index as right-aligned, space padded
//! decimal text of exactly [`ACK_WIDTH`] bytes, e.g. `"    3"` or `"   -1"`.

use core::fmt::Write;

use heapless::String;

use crate::error::{Error, Result};
use crate::ACK_WIDTH;

/// Index acknowledged before any slice has been accepted.
pub const NOTHING_ACCEPTED: i64 = -1;

/// Fixed-width acknowledgment text.
pub type AckText = String<ACK_WIDTH>;

/// Renders `index` as acknowledgment text.
pub fn encode_ack(index: i64) -> Result<AckText> {
    let mut text = AckText::new();
    write!(text, "{:>width$}", index, width = ACK_WIDTH).map_err(|_| Error::PayloadTooLarge)?;
    Ok(text)
}

/// Parses acknowledgment text back into an index.
///
/// Returns `None` for anything that is not padded decimal text; a garbled
/// acknowledgment never confirms a slice.
pub fn decode_ack(payload: &[u8]) -> Option<i64> {
    let text = core::str::from_utf8(payload).ok()?;
    let digits = text.trim_matches(|c: char| c == ' ' || c == '\0');
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
