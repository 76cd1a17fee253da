//! Error types for WOBA decoding.

use core::fmt;

/// The error type for WOBA decoding operations.
///
/// The opcode stream has no notion of an invalid opcode: every byte value
/// classifies to some operation. A malformed record therefore fails with one
/// of the two variants below, or decodes to corrupted pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A buffer or plane access fell outside its bounds.
    OutOfBounds,
    /// An opcode requested more input bytes than the record contains.
    TruncatedStream,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "buffer access out of bounds"),
            Self::TruncatedStream => write!(f, "opcode stream ended unexpectedly"),
        }
    }
}

impl core::error::Error for DecodeError {}

/// Result type for WOBA decoding operations.
pub type Result<T> = core::result::Result<T, DecodeError>;
