//! Error types for the transport.

use core::fmt;

/// Errors raised for local faults.
///
/// Lost frames and missing acknowledgments are not errors: they show up as
/// short byte counts from `send` and `receive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration values are out of range.
    InvalidConfig,

    /// Payload needs more slices than an acknowledgment can name.
    PayloadTooLarge,

    /// Caller buffer cannot hold the data.
    BufferTooSmall,

    /// Header fields violate slice invariants.
    InvalidHeader,

    /// Wire bytes do not form a frame.
    InvalidFrame,

    /// Frame was encoded by an incompatible protocol version.
    VersionMismatch,

    /// The underlying channel reached end of stream.
    ChannelClosed,

    /// Underlying I/O failure.
    IoError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig => write!(f, "Invalid transport configuration"),
            Error::PayloadTooLarge => write!(f, "Payload too large"),
            Error::BufferTooSmall => write!(f, "Buffer too small"),
            Error::InvalidHeader => write!(f, "Invalid frame header"),
            Error::InvalidFrame => write!(f, "Invalid frame"),
            Error::VersionMismatch => write!(f, "Invalid protocol version"),
            Error::ChannelClosed => write!(f, "Channel closed"),
            Error::IoError => write!(f, "I/O error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl From<Error> for std::io::Error {
    fn from(err: Error) -> std::io::Error {
        let kind = match err {
            Error::ChannelClosed => std::io::ErrorKind::UnexpectedEof,
            Error::BufferTooSmall | Error::PayloadTooLarge | Error::InvalidConfig => {
                std::io::ErrorKind::InvalidInput
            }
            Error::InvalidHeader | Error::InvalidFrame | Error::VersionMismatch => {
                std::io::ErrorKind::InvalidData
            }
            Error::IoError => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_kind() {
        let err: std::io::Error = Error::ChannelClosed.into();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);

        let err: std::io::Error = Error::VersionMismatch.into();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_display() {
        assert_eq!(std::format!("{}", Error::BufferTooSmall), "Buffer too small");
    }
}
