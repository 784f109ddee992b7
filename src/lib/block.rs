//! Single-block BGZF codec.
//!
//! A BGZF stream is a series of independent gzip members ("blocks"), each carrying a `BC`
//! extra subfield that records the block's own framed size. The block structure:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ Header (12 bytes)                                               │
//! │  - Magic: 0x1f 0x8b 0x08 0x04 (gzip, deflate, FEXTRA)           │
//! │  - MTIME (4), XFL (1), OS (1)                                   │
//! │  - XLEN: 2 bytes (= 6 when written here)                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ Extra subfields (XLEN bytes)                                    │
//! │  - "BC" + SLEN(2) = 2 + BSIZE(2)                                │
//! │    where BSIZE = total_block_size - 1                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ Raw deflate data                                                │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ Footer (8 bytes)                                                │
//! │  - CRC32 of the uncompressed payload                            │
//! │  - ISIZE: uncompressed payload length                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Compression and decompression use libdeflate (raw deflate, no zlib/gzip wrapper) and the
//! CRC32 is computed with `crc32fast`.

use std::io::{self, Read};

use libdeflater::{CompressionLvl, Compressor, DecompressionError, Decompressor};
use log::debug;

use crate::errors::{BgzfError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Gzip magic, deflate method and FEXTRA flag that open every BGZF block.
pub const BGZF_MAGIC: [u8; 4] = [0x1f, 0x8b, 0x08, 0x04];

/// Size of the BGZF block header as written by [`BlockEncoder`] (gzip header + `BC` subfield).
pub const BGZF_HEADER_SIZE: usize = 18;

/// Size of the BGZF block footer (CRC32 + ISIZE).
pub const BGZF_FOOTER_SIZE: usize = 8;

/// Largest framed block the 16-bit `BSIZE` field can describe.
pub const MAX_BLOCK_SIZE: usize = 1 << 16;

/// Largest uncompressed payload a single block may carry.
pub const MAX_PAYLOAD_SIZE: usize = 1 << 16;

/// Default deflate compression level.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Highest compression level accepted by libdeflate.
pub const MAX_COMPRESSION_LEVEL: u32 = 12;

/// BGZF EOF marker block (empty block signaling end of file).
pub const BGZF_EOF: [u8; 28] = [
    0x1f, 0x8b, 0x08, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0x06, 0x00, 0x42, 0x43, 0x02, 0x00,
    0x1b, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Fixed gzip header bytes before the extra field (magic, MTIME, XFL, OS, XLEN).
const GZIP_FIXED_HEADER_SIZE: usize = 12;

/// Bytes of a block that are neither extra field nor deflate data, minus one for `BSIZE`.
const NON_EXTRA_OVERHEAD: usize = GZIP_FIXED_HEADER_SIZE + BGZF_FOOTER_SIZE - 1;

const BC_SUBFIELD_ID: [u8; 2] = *b"BC";

// ============================================================================
// Block type
// ============================================================================

/// One decoded BGZF block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// File offset at which the block starts.
    pub start_offset: u64,
    /// Total on-wire size of the block, header and footer included.
    pub framed_size: usize,
    /// Decompressed payload.
    pub data: Vec<u8>,
}

impl Block {
    /// File offset of the block that follows this one.
    #[must_use]
    pub fn end_offset(&self) -> u64 {
        self.start_offset + self.framed_size as u64
    }

    /// Returns true for a zero-length payload, the conventional end-of-stream marker.
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        self.data.is_empty()
    }
}

/// Checks that a compression level is one libdeflate accepts.
///
/// # Errors
///
/// Returns [`BgzfError::InvalidParameter`] for levels above [`MAX_COMPRESSION_LEVEL`].
pub fn validate_compression_level(level: u32) -> Result<()> {
    compression_lvl(level).map(|_| ())
}

fn compression_lvl(level: u32) -> Result<CompressionLvl> {
    i32::try_from(level)
        .ok()
        .and_then(|lvl| CompressionLvl::new(lvl).ok())
        .ok_or_else(|| BgzfError::InvalidParameter {
            parameter: "compression-level".to_string(),
            reason: format!("must be between 0 and {MAX_COMPRESSION_LEVEL}, got {level}"),
        })
}

// ============================================================================
// Encoding
// ============================================================================

/// Compresses payloads into framed BGZF blocks.
///
/// The libdeflate compressor is kept between calls so repeated encodes reuse its state.
pub struct BlockEncoder {
    compressor: Compressor,
    level: u32,
}

impl BlockEncoder {
    /// Creates an encoder with the given compression level (0-12).
    ///
    /// # Errors
    ///
    /// Returns [`BgzfError::InvalidParameter`] if the level is out of range.
    pub fn new(compression_level: u32) -> Result<Self> {
        let lvl = compression_lvl(compression_level)?;
        Ok(Self { compressor: Compressor::new(lvl), level: compression_level })
    }

    /// The configured compression level.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Encodes `payload` into a new framed block.
    ///
    /// # Errors
    ///
    /// See [`BlockEncoder::encode_into`].
    pub fn encode(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut block = Vec::new();
        self.encode_into(payload, &mut block)?;
        Ok(block)
    }

    /// Encodes `payload` as one framed block appended to `out`.
    ///
    /// On error `out` is left exactly as it was.
    ///
    /// # Panics
    ///
    /// Panics if `payload` is longer than [`MAX_PAYLOAD_SIZE`]; chunking is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns [`BgzfError::EncodeOverflow`] if the framed block would exceed
    /// [`MAX_BLOCK_SIZE`]. The block is never split here.
    pub fn encode_into(&mut self, payload: &[u8], out: &mut Vec<u8>) -> Result<()> {
        assert!(
            payload.len() <= MAX_PAYLOAD_SIZE,
            "BGZF payload of {} bytes exceeds the {MAX_PAYLOAD_SIZE} byte block limit",
            payload.len()
        );

        let start = out.len();
        let bound = self.compressor.deflate_compress_bound(payload.len());
        out.resize(start + BGZF_HEADER_SIZE + bound, 0);

        let compressed_size =
            match self.compressor.deflate_compress(payload, &mut out[start + BGZF_HEADER_SIZE..]) {
                Ok(size) => size,
                Err(e) => {
                    out.truncate(start);
                    return Err(BgzfError::Io(io::Error::other(format!(
                        "BGZF compression failed: {e:?}"
                    ))));
                }
            };

        let framed_size = BGZF_HEADER_SIZE + compressed_size + BGZF_FOOTER_SIZE;
        let Some(bsize) = u16::try_from(framed_size - 1).ok() else {
            out.truncate(start);
            return Err(BgzfError::EncodeOverflow {
                uncompressed: payload.len(),
                compressed: framed_size,
                limit: MAX_BLOCK_SIZE,
            });
        };

        let header = &mut out[start..start + BGZF_HEADER_SIZE];
        header[..4].copy_from_slice(&BGZF_MAGIC);
        header[4..8].copy_from_slice(&[0, 0, 0, 0]); // MTIME
        header[8] = 0x00; // XFL
        header[9] = 0xff; // OS (unknown)
        header[10..12].copy_from_slice(&6u16.to_le_bytes()); // XLEN
        header[12..14].copy_from_slice(&BC_SUBFIELD_ID);
        header[14..16].copy_from_slice(&2u16.to_le_bytes()); // SLEN
        header[16..18].copy_from_slice(&bsize.to_le_bytes());

        out.truncate(start + BGZF_HEADER_SIZE + compressed_size);
        out.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
        let payload_len = u32::try_from(payload.len()).expect("payload length checked against 64KiB");
        out.extend_from_slice(&payload_len.to_le_bytes());

        Ok(())
    }
}

/// Encodes a single payload at the given compression level.
///
/// # Errors
///
/// Returns [`BgzfError::InvalidParameter`] for a bad level or [`BgzfError::EncodeOverflow`]
/// if the payload does not compress into one block.
pub fn encode_block(payload: &[u8], compression_level: u32) -> Result<Vec<u8>> {
    BlockEncoder::new(compression_level)?.encode(payload)
}

// ============================================================================
// Decoding
// ============================================================================

/// Reads and validates framed BGZF blocks.
pub struct BlockDecoder {
    decompressor: Decompressor,
}

impl Default for BlockDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDecoder {
    /// Creates a decoder.
    #[must_use]
    pub fn new() -> Self {
        Self { decompressor: Decompressor::new() }
    }

    /// Reads the next block from `reader`, which must be positioned at `start_offset`.
    ///
    /// Returns `Ok(None)` if the input is exhausted exactly at a block boundary.
    ///
    /// # Errors
    ///
    /// - [`BgzfError::Format`] for a bad magic, malformed extra field or missing `BC` subfield
    /// - [`BgzfError::TruncatedStream`] if the input ends inside the block
    /// - [`BgzfError::Corruption`] if the payload fails to inflate or its CRC32 or length does
    ///   not match the footer
    pub fn read_block<R: Read + ?Sized>(
        &mut self,
        reader: &mut R,
        start_offset: u64,
    ) -> Result<Option<Block>> {
        let mut magic = [0u8; 4];
        let n = read_up_to(reader, &mut magic)?;
        if n == 0 {
            return Ok(None);
        }
        if n < magic.len() {
            return Err(truncated(start_offset, "block magic"));
        }
        if magic != BGZF_MAGIC {
            return Err(BgzfError::Format {
                offset: start_offset,
                reason: format!(
                    "a BGZF block should start with 1f 8b 08 04, not {:02x} {:02x} {:02x} {:02x}",
                    magic[0], magic[1], magic[2], magic[3]
                ),
            });
        }

        // MTIME (4), XFL (1), OS (1), XLEN (2)
        let mut fixed = [0u8; 8];
        read_exact_or_truncated(reader, &mut fixed, start_offset, "gzip header")?;
        let extra_len = usize::from(u16::from_le_bytes([fixed[6], fixed[7]]));

        let mut extra = vec![0u8; extra_len];
        read_exact_or_truncated(reader, &mut extra, start_offset, "extra field")?;
        let framed_size = parse_block_size(&extra, start_offset)?;

        let Some(deflate_size) = framed_size.checked_sub(NON_EXTRA_OVERHEAD + 1 + extra_len) else {
            return Err(BgzfError::Format {
                offset: start_offset,
                reason: format!(
                    "block size {framed_size} is smaller than its header and footer ({} bytes)",
                    NON_EXTRA_OVERHEAD + 1 + extra_len
                ),
            });
        };

        let mut body = vec![0u8; deflate_size + BGZF_FOOTER_SIZE];
        read_exact_or_truncated(reader, &mut body, start_offset, "compressed data")?;
        let (compressed, footer) = body.split_at(deflate_size);
        let expected_crc = u32::from_le_bytes([footer[0], footer[1], footer[2], footer[3]]);
        let expected_size = u32::from_le_bytes([footer[4], footer[5], footer[6], footer[7]]) as usize;

        if expected_size > MAX_PAYLOAD_SIZE {
            return Err(BgzfError::Corruption {
                offset: start_offset,
                reason: format!(
                    "declared uncompressed size {expected_size} exceeds {MAX_PAYLOAD_SIZE}"
                ),
            });
        }

        // One spare byte so a payload that inflates past its declared size is caught as a
        // length mismatch rather than silently clipped.
        let mut data = vec![0u8; expected_size + 1];
        let actual_size = match self.decompressor.deflate_decompress(compressed, &mut data) {
            Ok(size) => size,
            Err(DecompressionError::InsufficientSpace) => {
                return Err(BgzfError::Corruption {
                    offset: start_offset,
                    reason: format!("decompressed to more than the declared {expected_size} bytes"),
                });
            }
            Err(e) => {
                return Err(BgzfError::Corruption {
                    offset: start_offset,
                    reason: format!("BGZF decompression failed: {e:?}"),
                });
            }
        };
        if actual_size != expected_size {
            return Err(BgzfError::Corruption {
                offset: start_offset,
                reason: format!("decompressed to {actual_size} bytes, not {expected_size}"),
            });
        }
        data.truncate(actual_size);

        let actual_crc = crc32fast::hash(&data);
        if actual_crc != expected_crc {
            return Err(BgzfError::Corruption {
                offset: start_offset,
                reason: format!(
                    "CRC32 mismatch: expected 0x{expected_crc:08x}, got 0x{actual_crc:08x}"
                ),
            });
        }

        debug!("Decoded BGZF block at {start_offset}: {framed_size} bytes -> {actual_size} bytes");
        Ok(Some(Block { start_offset, framed_size, data }))
    }
}

/// Reads one block with a throwaway decoder.
///
/// # Errors
///
/// See [`BlockDecoder::read_block`].
pub fn decode_block<R: Read + ?Sized>(reader: &mut R, start_offset: u64) -> Result<Option<Block>> {
    BlockDecoder::new().read_block(reader, start_offset)
}

/// Walks the extra subfields and returns the framed block size from the single `BC` entry.
fn parse_block_size(extra: &[u8], offset: u64) -> Result<usize> {
    let format_error = |reason: String| BgzfError::Format { offset, reason };

    let mut block_size = None;
    let mut pos = 0;
    while pos < extra.len() {
        if pos + 4 > extra.len() {
            return Err(format_error(format!("extra subfield header truncated at byte {pos}")));
        }
        let id = [extra[pos], extra[pos + 1]];
        let subfield_len = usize::from(u16::from_le_bytes([extra[pos + 2], extra[pos + 3]]));
        let data_start = pos + 4;
        let data_end = data_start + subfield_len;
        if data_end > extra.len() {
            return Err(format_error(format!(
                "extra subfield of {subfield_len} bytes overruns the {} byte extra field",
                extra.len()
            )));
        }

        if id == BC_SUBFIELD_ID {
            if subfield_len != 2 {
                return Err(format_error(format!(
                    "BC subfield payload must be 2 bytes, got {subfield_len}"
                )));
            }
            if block_size.is_some() {
                return Err(format_error("two BC subfields in one block".to_string()));
            }
            let bsize = u16::from_le_bytes([extra[data_start], extra[data_start + 1]]);
            block_size = Some(usize::from(bsize) + 1);
        }
        pos = data_end;
    }

    block_size.ok_or_else(|| {
        format_error("missing BC subfield, not a valid block-structured (BGZF) stream".to_string())
    })
}

/// Fills as much of `buf` as the reader can supply, returning the number of bytes read.
fn read_up_to<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn read_exact_or_truncated<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    offset: u64,
    what: &str,
) -> Result<()> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(truncated(offset, what)),
        Err(e) => Err(e.into()),
    }
}

fn truncated(offset: u64, what: &str) -> BgzfError {
    BgzfError::TruncatedStream { offset, reason: format!("input ended while reading {what}") }
}

// ============================================================================
// Tests
// ============================================================================
