//! Block-level iteration over a BGZF stream.
//!
//! [`Blocks`] yields each decoded [`Block`] together with its file offset and framed size,
//! which is what an index builder needs. Iteration ends at the first empty block, at a
//! clean end of input, or after the first error.

use std::io::Read;
use std::iter::FusedIterator;

use crate::block::{Block, BlockDecoder};
use crate::errors::Result;

/// Iterator over the blocks of a BGZF stream.
pub struct Blocks<R> {
    inner: R,
    decoder: BlockDecoder,
    offset: u64,
    done: bool,
}

impl<R: Read> Blocks<R> {
    /// Iterates from the current position of `inner`, treating it as file offset 0.
    pub fn new(inner: R) -> Self {
        Self::with_offset(inner, 0)
    }

    /// Iterates from the current position of `inner`, which sits at file offset `offset`.
    pub fn with_offset(inner: R, offset: u64) -> Self {
        Self { inner, decoder: BlockDecoder::new(), offset, done: false }
    }

    /// File offset of the next block to be read.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Consumes the iterator, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Iterator for Blocks<R> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.decoder.read_block(&mut self.inner, self.offset) {
            Ok(Some(block)) => {
                self.offset = block.end_offset();
                if block.is_terminator() {
                    self.done = true;
                }
                Some(Ok(block))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> FusedIterator for Blocks<R> {}
