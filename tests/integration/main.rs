//! Integration tests for blockgz.
//!
//! These tests exercise the library end to end through files and the `blockgz` binary,
//! and check that the output interoperates with ordinary gzip tooling.

mod helpers;
mod test_blocks_command;
mod test_compress_command;
mod test_decompress_command;
mod test_gzip_interop;
mod test_random_access;
mod test_round_trip;
