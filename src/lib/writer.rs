//! BGZF writer.
//!
//! [`BgzfWriter`] buffers incoming bytes and emits a framed block each time the buffer
//! reaches the configured block size (65536 bytes by default). Explicit [`BgzfWriter::flush`]
//! calls emit whatever is pending as a final, possibly short, block; flushing with nothing
//! pending produces an empty block, which doubles as the end-of-stream marker.
//!
//! # Usage
//!
//! ```
//! use blockgz_lib::writer::BgzfWriter;
//!
//! # fn main() -> blockgz_lib::errors::Result<()> {
//! let mut writer = BgzfWriter::new(Vec::new());
//! writer.write_bytes(b"ACGT")?;
//! let offset = writer.virtual_offset()?;
//! writer.write_bytes(b"TTGA")?;
//! let bgzf = writer.finish()?;
//! assert_eq!(offset.within_block(), 4);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::io::{self, Write};

use log::{debug, warn};

use crate::block::{
    BGZF_EOF, BlockEncoder, DEFAULT_COMPRESSION_LEVEL, MAX_PAYLOAD_SIZE, validate_compression_level,
};
use crate::errors::{BgzfError, Result};
use crate::virtual_offset::VirtualOffset;

/// Block size used by htslib; leaves room for deflate's worst-case expansion so even
/// incompressible chunks fit a single block.
pub const HTSLIB_BLOCK_SIZE: usize = 65280;

// ============================================================================
// Configuration
// ============================================================================

/// Settings for a [`BgzfWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Deflate compression level (0-12).
    pub compression_level: u32,
    /// Uncompressed bytes per full block (1-65536).
    pub block_size: usize,
    /// File offset of the sink's current position, used for virtual offsets.
    ///
    /// Non-zero when appending to an existing stream.
    pub start_position: u64,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            block_size: MAX_PAYLOAD_SIZE,
            start_position: 0,
        }
    }
}

impl WriterOptions {
    /// Checks that every setting is in range.
    ///
    /// # Errors
    ///
    /// Returns [`BgzfError::InvalidParameter`] naming the first bad setting.
    pub fn validate(&self) -> Result<()> {
        validate_compression_level(self.compression_level)?;
        validate_block_size(self.block_size)
    }
}

fn validate_block_size(block_size: usize) -> Result<()> {
    if block_size == 0 || block_size > MAX_PAYLOAD_SIZE {
        return Err(BgzfError::InvalidParameter {
            parameter: "block-size".to_string(),
            reason: format!("must be between 1 and {MAX_PAYLOAD_SIZE}, got {block_size}"),
        });
    }
    Ok(())
}

// ============================================================================
// Writer
// ============================================================================

/// Compressing writer producing a BGZF stream.
///
/// Failed writes and flushes never lose data. Bytes that were not yet encoded stay in the
/// pending buffer, and a block the sink only partly accepted is kept so that the next
/// write, flush, close or finish resumes it where the sink stopped. A caller can therefore
/// fix the underlying problem (or shrink the block size after an
/// [`BgzfError::EncodeOverflow`]) and retry without corrupting the stream.
pub struct BgzfWriter<W: Write> {
    /// Present until the writer is closed.
    inner: Option<W>,
    encoder: BlockEncoder,
    /// Bytes awaiting compression; at most one block unless an emission failed.
    buffer: Vec<u8>,
    block_size: usize,
    /// File offset of the sink after every encoded block, including one still in flight.
    position: u64,
    blocks_written: u64,
    /// The most recently encoded framed block.
    scratch: Vec<u8>,
    /// Bytes of `scratch` the sink has accepted.
    scratch_written: usize,
    /// Set once `flush` has encoded its final block, until the flush completes.
    tail_emitted: bool,
    /// Set once `finish` has encoded the EOF block.
    eof_emitted: bool,
}

/// Error returned by [`BgzfWriter::close`] and [`BgzfWriter::finish`].
///
/// Holds the writer so the caller can retry after fixing the sink, in the manner of
/// [`std::io::IntoInnerError`].
pub struct CloseError<W: Write> {
    writer: BgzfWriter<W>,
    error: BgzfError,
}

impl<W: Write> CloseError<W> {
    /// The error that stopped the close.
    #[must_use]
    pub fn error(&self) -> &BgzfError {
        &self.error
    }

    /// Returns the writer, with all unwritten data still held.
    #[must_use]
    pub fn into_writer(self) -> BgzfWriter<W> {
        self.writer
    }

    /// Returns the error, dropping the writer (which makes a last best-effort flush).
    #[must_use]
    pub fn into_error(self) -> BgzfError {
        self.error
    }

    /// Splits into the writer and the error.
    #[must_use]
    pub fn into_parts(self) -> (BgzfWriter<W>, BgzfError) {
        (self.writer, self.error)
    }
}

impl<W: Write> fmt::Debug for CloseError<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseError").field("error", &self.error).finish_non_exhaustive()
    }
}

impl<W: Write> fmt::Display for CloseError<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<W: Write> std::error::Error for CloseError<W> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<W: Write> From<CloseError<W>> for BgzfError {
    fn from(error: CloseError<W>) -> Self {
        error.into_error()
    }
}

impl<W: Write> BgzfWriter<W> {
    /// Creates a writer with the default options (level 6, 65536-byte blocks).
    ///
    /// # Panics
    ///
    /// Panics if the default compression level is rejected by libdeflate (should never happen).
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self::with_options(inner, WriterOptions::default())
            .expect("default BGZF writer options are valid")
    }

    /// Creates a writer with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`BgzfError::InvalidParameter`] if the options fail validation.
    pub fn with_options(inner: W, options: WriterOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            inner: Some(inner),
            encoder: BlockEncoder::new(options.compression_level)?,
            buffer: Vec::with_capacity(options.block_size),
            block_size: options.block_size,
            position: options.start_position,
            blocks_written: 0,
            scratch: Vec::new(),
            scratch_written: 0,
            tail_emitted: false,
            eof_emitted: false,
        })
    }

    /// The configured compression level.
    #[must_use]
    pub fn compression_level(&self) -> u32 {
        self.encoder.level()
    }

    /// Uncompressed bytes per full block.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Changes the block size used for subsequent emission, including pending data.
    ///
    /// # Errors
    ///
    /// Returns [`BgzfError::InvalidParameter`] unless `1 <= block_size <= 65536`.
    pub fn set_block_size(&mut self, block_size: usize) -> Result<()> {
        validate_block_size(block_size)?;
        self.block_size = block_size;
        Ok(())
    }

    /// Number of bytes buffered and not yet encoded into a block.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// File offset of the sink after all blocks encoded so far.
    ///
    /// Includes a block the sink has only partly accepted; it is completed on the next retry.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of blocks emitted, including empty ones.
    #[must_use]
    pub fn blocks_written(&self) -> u64 {
        self.blocks_written
    }

    /// Virtual offset at which the next written byte will be found once flushed.
    ///
    /// # Errors
    ///
    /// Returns [`BgzfError::Range`] if the sink position has reached 2^48, or if a full
    /// block is still pending after a failed emission.
    pub fn virtual_offset(&self) -> Result<VirtualOffset> {
        VirtualOffset::new(self.position, self.buffer.len() as u64)
    }

    /// Returns a reference to the underlying sink.
    ///
    /// # Panics
    ///
    /// Panics if called while the writer is being dropped after `close`.
    #[must_use]
    pub fn get_ref(&self) -> &W {
        self.inner.as_ref().expect("BGZF sink is present until close")
    }

    /// Returns a mutable reference to the underlying sink.
    ///
    /// # Panics
    ///
    /// Panics if called while the writer is being dropped after `close`.
    pub fn get_mut(&mut self) -> &mut W {
        self.inner.as_mut().expect("BGZF sink is present until close")
    }

    /// Appends `data`, emitting a block for every full chunk of `block_size` bytes.
    ///
    /// Full chunks are compressed straight from `data`; only the trailing partial chunk is
    /// copied into the pending buffer.
    ///
    /// # Errors
    ///
    /// Returns encode or sink errors. Every byte of `data` is accepted either way: those not
    /// yet encoded are buffered, so the caller should retry with [`BgzfWriter::flush`] rather
    /// than writing them again.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        if !data.is_empty() {
            self.tail_emitted = false;
            self.eof_emitted = false;
        }
        let mut rest = data;
        let result = self.write_chunks(&mut rest);
        if result.is_err() {
            self.buffer.extend_from_slice(rest);
        }
        result
    }

    /// Emits all pending data, ending with a (possibly empty) short block, and flushes the sink.
    ///
    /// Calling this with nothing pending writes an empty block, so two consecutive flushes
    /// terminate the stream. Retrying after a failure does not repeat the final block.
    ///
    /// # Errors
    ///
    /// Returns encode or sink errors, leaving unemitted data held for the next attempt.
    pub fn flush(&mut self) -> Result<()> {
        self.write_in_flight()?;
        self.emit_full_blocks()?;
        if !self.tail_emitted {
            self.encode_buffered(self.buffer.len())?;
            self.tail_emitted = true;
        }
        self.write_in_flight()?;
        self.sink()?.flush()?;
        self.tail_emitted = false;
        Ok(())
    }

    /// Flushes pending data, if any, and returns the sink.
    ///
    /// No terminator block is added beyond what `flush` produces; use
    /// [`BgzfWriter::finish`] or flush twice for that.
    ///
    /// # Errors
    ///
    /// Returns a [`CloseError`] holding the writer if the final flush fails; calling
    /// `close` again on the recovered writer resumes where it stopped.
    pub fn close(mut self) -> std::result::Result<W, CloseError<W>> {
        match self.settle() {
            Ok(()) => self.release(),
            Err(error) => Err(CloseError { writer: self, error }),
        }
    }

    /// Flushes pending data, if any, appends the standard 28-byte EOF block, and returns the sink.
    ///
    /// # Errors
    ///
    /// Returns a [`CloseError`] holding the writer on encode or sink errors; calling
    /// `finish` again on the recovered writer writes the EOF block exactly once.
    pub fn finish(mut self) -> std::result::Result<W, CloseError<W>> {
        match self.settle().and_then(|()| self.emit_eof()) {
            Ok(()) => self.release(),
            Err(error) => Err(CloseError { writer: self, error }),
        }
    }

    /// Completes any in-flight block and flushes pending data, then flushes the sink.
    fn settle(&mut self) -> Result<()> {
        self.write_in_flight()?;
        if !self.buffer.is_empty() {
            self.flush()?;
        }
        self.sink()?.flush()?;
        Ok(())
    }

    fn emit_eof(&mut self) -> Result<()> {
        if !self.eof_emitted {
            self.scratch.clear();
            self.scratch.extend_from_slice(&BGZF_EOF);
            self.scratch_written = 0;
            self.position += BGZF_EOF.len() as u64;
            self.blocks_written += 1;
            self.eof_emitted = true;
        }
        self.write_in_flight()?;
        self.sink()?.flush()?;
        Ok(())
    }

    fn release(mut self) -> std::result::Result<W, CloseError<W>> {
        match self.inner.take() {
            Some(inner) => Ok(inner),
            None => Err(CloseError { writer: self, error: closed_error() }),
        }
    }

    fn sink(&mut self) -> Result<&mut W> {
        self.inner.as_mut().ok_or_else(closed_error)
    }

    /// Emits blocks for `data`, advancing it past every byte that has been encoded.
    fn write_chunks(&mut self, data: &mut &[u8]) -> Result<()> {
        self.write_in_flight()?;
        self.emit_full_blocks()?;

        if !self.buffer.is_empty() {
            let take = (self.block_size - self.buffer.len()).min(data.len());
            let (head, rest) = data.split_at(take);
            self.buffer.extend_from_slice(head);
            *data = rest;
            if self.buffer.len() < self.block_size {
                return Ok(());
            }
            self.encode_buffered(self.block_size)?;
            self.write_in_flight()?;
        }

        while data.len() >= self.block_size {
            let (chunk, rest) = data.split_at(self.block_size);
            self.encode_block(chunk)?;
            *data = rest;
            self.write_in_flight()?;
        }

        self.buffer.extend_from_slice(*data);
        *data = &[];
        Ok(())
    }

    fn emit_full_blocks(&mut self) -> Result<()> {
        while self.buffer.len() >= self.block_size {
            self.encode_buffered(self.block_size)?;
            self.write_in_flight()?;
        }
        Ok(())
    }

    /// Encodes the first `len` pending bytes as one block.
    ///
    /// Pending bytes are dropped as soon as the block is encoded; from then on the framed
    /// block itself is retained until the sink has taken all of it.
    fn encode_buffered(&mut self, len: usize) -> Result<()> {
        let buffer = std::mem::take(&mut self.buffer);
        let encoded = self.encode_block(&buffer[..len]);
        self.buffer = buffer;
        encoded?;
        self.buffer.drain(..len);
        Ok(())
    }

    /// Encodes `payload` into `scratch` and accounts for it as emitted.
    fn encode_block(&mut self, payload: &[u8]) -> Result<()> {
        self.write_in_flight()?;
        self.scratch.clear();
        self.scratch_written = 0;
        self.encoder.encode_into(payload, &mut self.scratch)?;
        debug!(
            "Encoded BGZF block at {}: {} bytes -> {} bytes",
            self.position,
            payload.len(),
            self.scratch.len()
        );
        self.position += self.scratch.len() as u64;
        self.blocks_written += 1;
        Ok(())
    }

    /// Hands the unwritten remainder of `scratch` to the sink.
    fn write_in_flight(&mut self) -> Result<()> {
        let Some(inner) = self.inner.as_mut() else {
            return Err(closed_error());
        };
        while self.scratch_written < self.scratch.len() {
            match inner.write(&self.scratch[self.scratch_written..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "sink accepted no bytes of a BGZF block",
                    )
                    .into());
                }
                Ok(n) => self.scratch_written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn has_in_flight(&self) -> bool {
        self.scratch_written < self.scratch.len()
    }
}

fn closed_error() -> BgzfError {
    BgzfError::Io(io::Error::other("BGZF writer is already closed"))
}

impl<W: Write> Write for BgzfWriter<W> {
    /// Buffers up to one block's worth of `buf`.
    ///
    /// If filling the buffer triggers an emission that fails, the accepted bytes are held
    /// and the failure is reported by the next `write` or `flush`.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_in_flight()?;
        self.emit_full_blocks()?;
        if buf.is_empty() {
            return Ok(0);
        }
        self.tail_emitted = false;
        self.eof_emitted = false;
        let n = buf.len().min(self.block_size - self.buffer.len());
        self.buffer.extend_from_slice(&buf[..n]);
        if self.buffer.len() >= self.block_size {
            if let Err(e) = self.emit_full_blocks() {
                debug!("Deferring BGZF block emission failure: {e}");
            }
        }
        Ok(n)
    }

    /// Emits complete blocks and flushes the sink; a partial block stays buffered.
    fn flush(&mut self) -> io::Result<()> {
        self.write_in_flight()?;
        self.emit_full_blocks()?;
        self.sink()?.flush()
    }
}

impl<W: Write> Drop for BgzfWriter<W> {
    fn drop(&mut self) {
        if self.inner.is_none() || (self.buffer.is_empty() && !self.has_in_flight()) {
            return;
        }
        if let Err(e) = self.settle() {
            warn!("Failed to flush BGZF writer on drop: {e}");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
