//! Shared helpers for integration tests.

use std::io::Cursor;
use std::path::Path;
use std::process::{Command, Output};

use blockgz_lib::{BgzfReader, BgzfWriter, WriterOptions};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::io::Read;

/// Deterministic incompressible payload.
pub fn random_payload(len: usize, seed: u64) -> Vec<u8> {
    let mut data = vec![0u8; len];
    StdRng::seed_from_u64(seed).fill_bytes(&mut data);
    data
}

/// Text-like payload of roughly `lines` SAM-ish records.
pub fn text_payload(lines: usize) -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..lines {
        data.extend_from_slice(
            format!("read{i}\t0\tchr1\t{}\t60\t8M\t*\t0\t0\tACGTACGT\tIIIIIIII\n", 100 + i)
                .as_bytes(),
        );
    }
    data
}

/// Compresses `payload` in memory with the given options and the EOF marker.
pub fn compress(payload: &[u8], options: WriterOptions) -> Vec<u8> {
    let mut writer = BgzfWriter::with_options(Vec::new(), options).unwrap();
    writer.write_bytes(payload).unwrap();
    writer.finish().unwrap()
}

/// Decompresses a whole in-memory BGZF stream.
pub fn decompress(data: Vec<u8>) -> Vec<u8> {
    let mut reader = BgzfReader::open(Cursor::new(data)).unwrap();
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    out
}

/// Runs the `blockgz` binary with `args`.
pub fn run_blockgz(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_blockgz"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to run blockgz")
}

/// Path as a `&str` for command arguments.
pub fn arg(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}
