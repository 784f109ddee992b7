//! BGZF reader with virtual-offset random access.
//!
//! [`BgzfReader`] loads one block at a time and exposes the concatenated decompressed
//! payloads as a flat byte stream. Its position is always expressible as a
//! [`VirtualOffset`], and with a seekable source it can jump to any virtual offset
//! previously obtained from [`BgzfReader::virtual_offset`] or a
//! [`BgzfWriter`](crate::writer::BgzfWriter).
//!
//! # Usage
//!
//! ```no_run
//! use blockgz_lib::reader::BgzfReader;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! # fn main() -> blockgz_lib::errors::Result<()> {
//! let mut reader = BgzfReader::open(BufReader::new(File::open("input.bam")?))?;
//! let magic = reader.read_bytes(4)?;
//! let bookmark = reader.virtual_offset()?;
//! let _ = reader.read_bytes(100)?;
//! reader.seek(bookmark)?;
//! # Ok(())
//! # }
//! ```

use std::io::{self, BufRead, Read, Seek, SeekFrom};

use log::debug;

use crate::block::{Block, BlockDecoder, MAX_PAYLOAD_SIZE};
use crate::errors::{BgzfError, Result};
use crate::virtual_offset::VirtualOffset;

/// Where the reader is in its block sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    /// A block is loaded; reads are served from its payload.
    BlockLoaded,
    /// The source ran out at a block boundary.
    EndOfStream,
    /// A decode failed; the position is undefined until the next seek.
    Failed,
}

/// Decompressing reader over a BGZF byte source.
///
/// Sequential reading only needs `R: Read`; [`BgzfReader::seek`] additionally needs `Seek`.
/// Zero-length blocks inside the stream are stepped over, so reads end only when the
/// source itself is exhausted.
pub struct BgzfReader<R> {
    inner: R,
    decoder: BlockDecoder,
    state: ReaderState,
    /// File offset of the loaded block.
    block_start: u64,
    /// Framed size of the loaded block (0 at end of stream).
    block_size: usize,
    /// Decompressed payload of the loaded block.
    buffer: Vec<u8>,
    /// Read cursor within `buffer`.
    cursor: usize,
}

impl<R: Read> BgzfReader<R> {
    /// Opens a reader positioned at the start of the stream, decoding the first block.
    ///
    /// The source is taken to be at file offset 0.
    ///
    /// # Errors
    ///
    /// Returns [`BgzfError::Format`] if the source is empty (every valid stream has at least
    /// a terminator block), or any error from decoding the first block.
    pub fn open(inner: R) -> Result<Self> {
        let mut reader = Self {
            inner,
            decoder: BlockDecoder::new(),
            state: ReaderState::EndOfStream,
            block_start: 0,
            block_size: 0,
            buffer: Vec::new(),
            cursor: 0,
        };
        if !reader.load_next_block()? {
            return Err(BgzfError::Format {
                offset: 0,
                reason: "empty input, expected at least one BGZF block".to_string(),
            });
        }
        Ok(reader)
    }

    /// Returns the virtual offset of the next byte to be read.
    ///
    /// When the loaded block is fully consumed this is the start of the following block,
    /// which addresses the same byte and keeps the within-block part below 2^16.
    ///
    /// # Errors
    ///
    /// Returns [`BgzfError::Unpositioned`] after a failed decode, or [`BgzfError::Range`] if
    /// a prior seek left the cursor outside the 16-bit range.
    pub fn virtual_offset(&self) -> Result<VirtualOffset> {
        if self.state == ReaderState::Failed {
            return Err(BgzfError::Unpositioned);
        }
        if self.cursor == self.buffer.len() {
            VirtualOffset::new(self.next_block_start(), 0)
        } else {
            VirtualOffset::new(self.block_start, self.cursor as u64)
        }
    }

    /// Reads exactly `n` bytes, crossing block boundaries as needed.
    ///
    /// # Errors
    ///
    /// Returns [`BgzfError::TruncatedStream`] if the stream ends before `n` bytes were read,
    /// or any decode error from loading the next block.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        // `n` may be far larger than the stream; grow as blocks arrive
        let loaded = self.buffer.len().saturating_sub(self.cursor);
        let mut out = Vec::with_capacity(n.min(loaded + MAX_PAYLOAD_SIZE));
        while out.len() < n {
            let available = self.fill()?;
            if available.is_empty() {
                return Err(BgzfError::TruncatedStream {
                    offset: self.block_start,
                    reason: format!(
                        "requested {n} bytes but the stream ended after {}",
                        out.len()
                    ),
                });
            }
            let take = available.len().min(n - out.len());
            out.extend_from_slice(&available[..take]);
            self.cursor += take;
        }
        Ok(out)
    }

    /// Returns true once the source is exhausted and the loaded payload fully consumed.
    ///
    /// # Errors
    ///
    /// Propagates decode errors from looking ahead to the next block.
    pub fn is_eof(&mut self) -> Result<bool> {
        Ok(self.fill()?.is_empty())
    }

    /// File offset of the currently loaded block.
    #[must_use]
    pub fn block_start(&self) -> u64 {
        self.block_start
    }

    /// Returns a reference to the underlying source.
    #[must_use]
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Consumes the reader, returning the underlying source.
    #[must_use]
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Returns the unread part of the loaded block, loading further blocks as needed.
    ///
    /// An empty slice means the end of the stream.
    fn fill(&mut self) -> Result<&[u8]> {
        loop {
            match self.state {
                ReaderState::Failed => return Err(BgzfError::Unpositioned),
                ReaderState::EndOfStream => break,
                ReaderState::BlockLoaded => {}
            }
            if self.cursor > self.buffer.len() {
                return Err(BgzfError::Range {
                    reason: format!(
                        "within-block offset {} is past the end of the {} byte block at {}",
                        self.cursor,
                        self.buffer.len(),
                        self.block_start
                    ),
                });
            }
            if self.cursor < self.buffer.len() || !self.load_next_block()? {
                break;
            }
        }
        let cursor = self.cursor.min(self.buffer.len());
        Ok(&self.buffer[cursor..])
    }

    /// Decodes the block following the loaded one. Returns false at a clean end of input.
    fn load_next_block(&mut self) -> Result<bool> {
        let next = self.next_block_start();
        match self.decoder.read_block(&mut self.inner, next) {
            Ok(Some(block)) => {
                self.install(block);
                Ok(true)
            }
            Ok(None) => {
                self.mark_end_of_stream(next);
                Ok(false)
            }
            Err(e) => {
                self.state = ReaderState::Failed;
                Err(e)
            }
        }
    }

    fn install(&mut self, block: Block) {
        self.state = ReaderState::BlockLoaded;
        self.block_start = block.start_offset;
        self.block_size = block.framed_size;
        self.buffer = block.data;
        self.cursor = 0;
    }

    fn mark_end_of_stream(&mut self, offset: u64) {
        self.state = ReaderState::EndOfStream;
        self.block_start = offset;
        self.block_size = 0;
        self.buffer.clear();
        self.cursor = 0;
    }

    fn next_block_start(&self) -> u64 {
        self.block_start + self.block_size as u64
    }
}

impl<R: Read + Seek> BgzfReader<R> {
    /// Moves to the given virtual offset.
    ///
    /// The underlying source is only repositioned when the offset lies in a different block
    /// than the one loaded. The within-block part is not validated here; an offset past the
    /// end of its block fails on the next read.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the source cannot seek, or any decode error for the target
    /// block. Seeking exactly to the end of the stream is allowed.
    pub fn seek(&mut self, offset: VirtualOffset) -> Result<()> {
        let (block_start, within_block) = offset.split();
        let reload = match self.state {
            ReaderState::Failed => true,
            ReaderState::BlockLoaded | ReaderState::EndOfStream => block_start != self.block_start,
        };
        if reload {
            debug!("Seeking BGZF source to block at {block_start}");
            self.inner.seek(SeekFrom::Start(block_start))?;
            match self.decoder.read_block(&mut self.inner, block_start) {
                Ok(Some(block)) => self.install(block),
                Ok(None) => self.mark_end_of_stream(block_start),
                Err(e) => {
                    self.state = ReaderState::Failed;
                    return Err(e);
                }
            }
        }
        // within_block < 2^16 by construction of VirtualOffset
        self.cursor = usize::try_from(within_block).unwrap_or(usize::MAX);
        Ok(())
    }
}

impl<R: Read> Read for BgzfReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.cursor += n;
        Ok(n)
    }
}

impl<R: Read> BufRead for BgzfReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Ok(self.fill()?)
    }

    fn consume(&mut self, amt: usize) {
        self.cursor = (self.cursor + amt).min(self.buffer.len());
    }
}

// ============================================================================
// Tests
// ============================================================================
