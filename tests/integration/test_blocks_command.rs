//! Integration tests for the blocks command.

use std::fs;

use blockgz_lib::WriterOptions;
use tempfile::TempDir;

use crate::helpers::{arg, compress, run_blockgz, text_payload};

#[test]
fn test_blocks_lists_offsets_and_sizes() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("listed.gz");
    let payload = text_payload(1_000);
    let options = WriterOptions { block_size: 20_000, ..WriterOptions::default() };
    let data = compress(&payload, options);
    fs::write(&input, &data).unwrap();

    let result = run_blockgz(&["blocks", "-i", arg(&input)]);
    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));

    let stdout = String::from_utf8(result.stdout).unwrap();
    let rows: Vec<Vec<usize>> = stdout
        .lines()
        .map(|line| line.split('\t').map(|f| f.parse().unwrap()).collect())
        .collect();

    assert_eq!(rows.len(), payload.len().div_ceil(20_000) + 1);
    assert_eq!(rows[0][0], 0);
    for pair in rows.windows(2) {
        assert_eq!(pair[0][0] + pair[0][1], pair[1][0]);
    }
    let last = rows.last().unwrap();
    assert_eq!(last[1..], [28, 0]);
    assert_eq!(last[0] + last[1], data.len());
    assert_eq!(rows.iter().map(|r| r[2]).sum::<usize>(), payload.len());
}

#[test]
fn test_blocks_reports_corruption() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("corrupt.gz");
    let mut data = compress(b"some data to damage", WriterOptions::default());
    let crc_at = data.len() - 28 - 8;
    data[crc_at] ^= 0x01;
    fs::write(&input, &data).unwrap();

    let result = run_blockgz(&["blocks", "-i", arg(&input)]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("CRC32 mismatch"));
}
