#![deny(unsafe_code)]
// Clippy lint configuration for CI
// These lints are allowed because:
// - cast_*: block and offset arithmetic moves between u16/u32/u64/usize on checked bounds
// - module_name_repetitions: types are named after the format (BgzfReader, BgzfError)
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::module_name_repetitions
)]

//! # blockgz - BGZF Reading and Writing Library
//!
//! BGZF (Blocked GZip Format) is the compression layer under BAM, BCF and tabix-indexed
//! files: a sequence of independent gzip members, each holding at most 64 KiB of data and
//! recording its own compressed size, so a reader can jump straight to any block.
//!
//! ## Overview
//!
//! ### Core Functionality
//!
//! - **[`block`]** - Single-block codec: framing, compression, CRC32 and length checks
//! - **[`virtual_offset`]** - 48/16-bit virtual offset packing
//! - **[`reader`]** - Sequential and random-access decompressing reader
//! - **[`writer`]** - Buffering, block-emitting compressing writer
//! - **[`blocks`]** - Block-by-block iteration for inspection and indexing
//!
//! ### Utilities
//!
//! - **[`bgzf_io`]** - Path-based reader/writer constructors
//! - **[`errors`]** - Typed error taxonomy
//! - **[`logging`]** - Formatting helpers for progress and summary logging
//!
//! ## Quick Start
//!
//! ```
//! use std::io::Cursor;
//! use blockgz_lib::{BgzfReader, BgzfWriter};
//!
//! # fn main() -> blockgz_lib::errors::Result<()> {
//! let mut writer = BgzfWriter::new(Vec::new());
//! writer.write_bytes(b"header\n")?;
//! let record_start = writer.virtual_offset()?;
//! writer.write_bytes(b"record one\n")?;
//! let data = writer.finish()?;
//!
//! let mut reader = BgzfReader::open(Cursor::new(data))?;
//! reader.seek(record_start)?;
//! assert_eq!(reader.read_bytes(10)?, b"record one");
//! # Ok(())
//! # }
//! ```

pub mod bgzf_io;
pub mod block;
pub mod blocks;
pub mod errors;
pub mod logging;
pub mod reader;
pub mod virtual_offset;
pub mod writer;

pub use block::{BGZF_EOF, Block};
pub use blocks::Blocks;
pub use errors::{BgzfError, Result};
pub use reader::BgzfReader;
pub use virtual_offset::{VirtualOffset, pack, unpack};
pub use writer::{BgzfWriter, CloseError, WriterOptions};
