//! CLI command implementations for blockgz.
//!
//! - [`compress`] - Compress plain data into a BGZF stream
//! - [`decompress`] - Decompress a BGZF stream, optionally from a virtual offset
//! - [`blocks`] - List the blocks of a BGZF file

pub mod blocks;
pub mod command;
pub mod common;
pub mod compress;
pub mod decompress;
