//! Custom error types for BGZF operations.
//!
//! Every failure surfaced by the codec, reader or writer is a [`BgzfError`] variant, so
//! callers can tell a clean end of data apart from corruption without matching on strings.

use std::io;

use thiserror::Error;

/// Result type alias for BGZF operations
pub type Result<T> = std::result::Result<T, BgzfError>;

/// Error type for BGZF operations
#[derive(Error, Debug)]
pub enum BgzfError {
    /// Malformed block header, magic bytes, or extra subfield structure
    #[error("Invalid BGZF block at offset {offset}: {reason}")]
    Format {
        /// File offset of the block start
        offset: u64,
        /// Explanation of the problem
        reason: String,
    },

    /// CRC32 or length mismatch on an otherwise well-formed block
    #[error("Corrupt BGZF block at offset {offset}: {reason}")]
    Corruption {
        /// File offset of the block start
        offset: u64,
        /// Explanation of the mismatch
        reason: String,
    },

    /// Virtual offset component outside its bit-width
    #[error("Virtual offset out of range: {reason}")]
    Range {
        /// Explanation of which component was out of bounds
        reason: String,
    },

    /// Input ended in the middle of a block or a requested read
    #[error("Truncated BGZF stream at offset {offset}: {reason}")]
    TruncatedStream {
        /// File offset at which the data ran out
        offset: u64,
        /// Explanation of what was being read
        reason: String,
    },

    /// Compressed payload does not fit the 16-bit block size field
    #[error(
        "BGZF block too large after compression: {uncompressed} bytes compressed to a \
         {compressed} byte block (limit {limit}); retry with a smaller block size"
    )]
    EncodeOverflow {
        /// Size of the uncompressed chunk
        uncompressed: usize,
        /// Framed size the chunk would have needed
        compressed: usize,
        /// Largest framed block the format can describe
        limit: usize,
    },

    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// A read was attempted after a failed decode without seeking first
    #[error("BGZF reader position is undefined after a previous error; seek before reading")]
    Unpositioned,

    /// Underlying I/O failure
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl BgzfError {
    /// Returns true if the error indicates damaged data rather than a usage or I/O problem.
    #[must_use]
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            BgzfError::Format { .. } | BgzfError::Corruption { .. } | BgzfError::TruncatedStream { .. }
        )
    }
}

impl From<BgzfError> for io::Error {
    fn from(error: BgzfError) -> Self {
        let kind = match error {
            BgzfError::Io(inner) => return inner,
            BgzfError::Format { .. } | BgzfError::Corruption { .. } => io::ErrorKind::InvalidData,
            BgzfError::TruncatedStream { .. } => io::ErrorKind::UnexpectedEof,
            BgzfError::Range { .. } | BgzfError::InvalidParameter { .. } => {
                io::ErrorKind::InvalidInput
            }
            BgzfError::EncodeOverflow { .. } | BgzfError::Unpositioned => io::ErrorKind::Other,
        };
        io::Error::new(kind, error)
    }
}
