//! Transport configuration.

use crate::error::{Error, Result};
use crate::{ACK_WIDTH, DEFAULT_MAX_FRAME_SIZE, DEFAULT_MAX_TRY};

/// What index a receiver puts in the acknowledgment it sends for every
/// arriving data frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckPolicy {
    /// Echo the index of the frame that just arrived, even when the frame is
    /// discarded as a duplicate or an out-of-order arrival.
    ///
    /// Wire compatible with legacy peers. A discarded future slice is then
    /// acknowledged, which can make the sender move on while the receiver
    /// still waits for an earlier index.
    EchoReceived,

    /// Acknowledge the highest contiguously accepted index (`-1` before
    /// anything was accepted).
    #[default]
    HighestAccepted,
}

/// Configuration shared by the sending and receiving side of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Payload bytes carried by one frame.
    pub max_frame_size: usize,

    /// Transmission attempts per slice on the sending side. The receiving
    /// side gives up after `max_try * total_slices` frames.
    pub max_try: u32,

    /// Acknowledgment content policy on the receiving side.
    pub ack_policy: AckPolicy,
}

impl Config {
    /// Creates a configuration with default values.
    pub const fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_try: DEFAULT_MAX_TRY,
            ack_policy: AckPolicy::HighestAccepted,
        }
    }

    /// Sets the payload capacity of one frame.
    pub fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Sets the per-slice attempt budget.
    pub fn with_max_try(mut self, max_try: u32) -> Self {
        self.max_try = max_try;
        self
    }

    /// Sets the acknowledgment policy.
    pub fn with_ack_policy(mut self, policy: AckPolicy) -> Self {
        self.ack_policy = policy;
        self
    }

    /// Checks that the values can drive a transfer.
    ///
    /// An acknowledgment must fit in one frame and a frame length must fit
    /// the 16-bit header field.
    pub fn validate(&self) -> Result<()> {
        if self.max_frame_size < ACK_WIDTH || self.max_frame_size > u16::MAX as usize {
            return Err(Error::InvalidConfig);
        }
        if self.max_try == 0 {
            return Err(Error::InvalidConfig);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
        assert_eq!(config.max_try, DEFAULT_MAX_TRY);
        assert_eq!(config.ack_policy, AckPolicy::HighestAccepted);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = Config::new()
            .with_max_frame_size(10)
            .with_max_try(3)
            .with_ack_policy(AckPolicy::EchoReceived);

        assert_eq!(config.max_frame_size, 10);
        assert_eq!(config.max_try, 3);
        assert_eq!(config.ack_policy, AckPolicy::EchoReceived);
    }

    #[test]
    fn test_rejects_frame_smaller_than_ack() {
        let config = Config::new().with_max_frame_size(ACK_WIDTH - 1);
        assert_eq!(config.validate(), Err(Error::InvalidConfig));
    }

    #[test]
    fn test_rejects_oversized_frame() {
        let config = Config::new().with_max_frame_size(u16::MAX as usize + 1);
        assert_eq!(config.validate(), Err(Error::InvalidConfig));
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let config = Config::new().with_max_try(0);
        assert_eq!(config.validate(), Err(Error::InvalidConfig));
    }
}
