//! Integration tests for the decompress command.

use std::fs;

use blockgz_lib::bgzf_io::create_writer;
use blockgz_lib::WriterOptions;
use tempfile::TempDir;

use crate::helpers::{arg, compress, run_blockgz, text_payload};

#[test]
fn test_decompress_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("reads.gz");
    let output = temp_dir.path().join("reads.sam");
    let payload = text_payload(3_000);
    fs::write(&input, compress(&payload, WriterOptions::default())).unwrap();

    let result = run_blockgz(&["decompress", "-i", arg(&input), "-o", arg(&output)]);
    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));
    assert_eq!(fs::read(&output).unwrap(), payload);
}

#[test]
fn test_decompress_from_virtual_offset_with_length() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("indexed.gz");

    let options = WriterOptions { block_size: 1000, ..WriterOptions::default() };
    let mut writer = create_writer(&input, options).unwrap();
    writer.write_bytes(&text_payload(100)).unwrap();
    let offset = writer.virtual_offset().unwrap();
    writer.write_bytes(b"TARGET RECORD\n").unwrap();
    writer.write_bytes(&text_payload(100)).unwrap();
    writer.finish().unwrap();
    assert!(offset.block_start() > 0);

    let raw = offset.get().to_string();
    let result = run_blockgz(&[
        "decompress",
        "-i",
        arg(&input),
        "--virtual-offset",
        &raw,
        "--length",
        "13",
    ]);
    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));
    assert_eq!(result.stdout, b"TARGET RECORD");
}

#[test]
fn test_decompress_length_past_end_fails() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("short.gz");
    fs::write(&input, compress(b"short", WriterOptions::default())).unwrap();

    let result = run_blockgz(&["decompress", "-i", arg(&input), "--length", "100"]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("ended after 5 of the 100"));
}

#[test]
fn test_decompress_virtual_offset_needs_file() {
    let result = run_blockgz(&["decompress", "--virtual-offset", "0"]);
    assert!(!result.status.success());
}
