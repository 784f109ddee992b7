//! BGZF virtual offsets.
//!
//! A virtual offset packs the file offset of a block start into the upper 48 bits and the
//! offset within that block's decompressed payload into the lower 16 bits:
//!
//! ```text
//! 63                                  16 15             0
//! ┌──────────────────────────────────────┬───────────────┐
//! │ block_start (file offset of block)   │ within_block  │
//! └──────────────────────────────────────┴───────────────┘
//! ```
//!
//! Both components are validated on construction; out-of-range values are a
//! [`BgzfError::Range`] rather than being silently truncated.

use std::fmt;

use crate::errors::{BgzfError, Result};

/// Number of bits holding the within-block offset.
pub const WITHIN_BLOCK_BITS: u32 = 16;

/// Exclusive upper bound for the within-block offset (2^16).
pub const MAX_WITHIN_BLOCK_OFFSET: u64 = 1 << WITHIN_BLOCK_BITS;

/// Exclusive upper bound for the block start offset (2^48).
pub const MAX_BLOCK_START_OFFSET: u64 = 1 << (64 - WITHIN_BLOCK_BITS);

/// Packs a block start offset and a within-block offset into a virtual offset.
///
/// # Errors
///
/// Returns [`BgzfError::Range`] unless `within_block < 2^16` and `block_start < 2^48`.
///
/// # Examples
///
/// ```
/// use blockgz_lib::virtual_offset::pack;
///
/// assert_eq!(pack(0, 65535).unwrap(), 65535);
/// assert_eq!(pack(100_000, 10).unwrap(), 6_553_600_010);
/// assert!(pack(0, 65536).is_err());
/// ```
pub fn pack(block_start: u64, within_block: u64) -> Result<u64> {
    if within_block >= MAX_WITHIN_BLOCK_OFFSET {
        return Err(BgzfError::Range {
            reason: format!("Require 0 <= within_block_offset < 2**16, got {within_block}"),
        });
    }
    if block_start >= MAX_BLOCK_START_OFFSET {
        return Err(BgzfError::Range {
            reason: format!("Require 0 <= block_start_offset < 2**48, got {block_start}"),
        });
    }
    Ok((block_start << WITHIN_BLOCK_BITS) | within_block)
}

/// Splits a virtual offset into `(block_start, within_block)`.
#[must_use]
pub fn unpack(offset: u64) -> (u64, u64) {
    let block_start = offset >> WITHIN_BLOCK_BITS;
    (block_start, offset - (block_start << WITHIN_BLOCK_BITS))
}

/// A validated 64-bit BGZF virtual offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualOffset(u64);

impl VirtualOffset {
    /// Creates a virtual offset from its two components.
    ///
    /// # Errors
    ///
    /// Returns [`BgzfError::Range`] if either component exceeds its bit-width.
    pub fn new(block_start: u64, within_block: u64) -> Result<Self> {
        pack(block_start, within_block).map(Self)
    }

    /// File offset of the block containing this position.
    #[must_use]
    pub fn block_start(self) -> u64 {
        unpack(self.0).0
    }

    /// Offset into the decompressed payload of that block.
    #[must_use]
    pub fn within_block(self) -> u64 {
        unpack(self.0).1
    }

    /// Returns `(block_start, within_block)`.
    #[must_use]
    pub fn split(self) -> (u64, u64) {
        unpack(self.0)
    }

    /// The packed 64-bit value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

// Every u64 unpacks to in-range components, so the raw conversion cannot fail.
impl From<u64> for VirtualOffset {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<VirtualOffset> for u64 {
    fn from(offset: VirtualOffset) -> Self {
        offset.0
    }
}

impl fmt::Display for VirtualOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (block_start, within_block) = self.split();
        write!(f, "{}:{block_start}/{within_block}", self.0)
    }
}
