//! Common CLI options shared across commands.
//!
//! This module provides shared argument structures that can be composed into
//! command structs using `#[command(flatten)]`.

use std::path::{Path, PathBuf};

use clap::Args;

use blockgz_lib::bgzf_io::{is_stdio, validate_file_exists};
use blockgz_lib::block::DEFAULT_COMPRESSION_LEVEL;
use blockgz_lib::writer::{HTSLIB_BLOCK_SIZE, WriterOptions};

/// Input/output options; `-` means standard input or output.
#[derive(Debug, Clone, Args)]
pub struct IoOptions {
    /// Input file, or `-` for standard input
    #[arg(short = 'i', long = "input", default_value = "-")]
    pub input: PathBuf,

    /// Output file, or `-` for standard output
    #[arg(short = 'o', long = "output", default_value = "-")]
    pub output: PathBuf,
}

impl IoOptions {
    /// Validates that the input file exists (skipped for stdin).
    ///
    /// # Errors
    ///
    /// Returns an error if the input file does not exist.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !is_stdio(&self.input) {
            validate_file_exists(&self.input, "Input file")?;
        }
        Ok(())
    }

    /// Display name for the input in log messages.
    pub fn input_name(&self) -> String {
        display_name(&self.input, "<stdin>")
    }

    /// Display name for the output in log messages.
    pub fn output_name(&self) -> String {
        display_name(&self.output, "<stdout>")
    }
}

fn display_name(path: &Path, stdio: &str) -> String {
    if is_stdio(path) { stdio.to_string() } else { path.display().to_string() }
}

/// Options for BGZF output compression.
#[derive(Debug, Clone, Args)]
pub struct CompressionOptions {
    /// Compression level (0-12).
    ///
    /// Level 0 stores data uncompressed inside deflate blocks.
    /// Level 12 produces the smallest files but is slowest.
    #[arg(short = 'l', long, default_value_t = DEFAULT_COMPRESSION_LEVEL)]
    pub compression_level: u32,

    /// Uncompressed bytes per block (1-65536).
    ///
    /// The default leaves headroom so incompressible data still fits a block.
    #[arg(long, default_value_t = HTSLIB_BLOCK_SIZE)]
    pub block_size: usize,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self { compression_level: DEFAULT_COMPRESSION_LEVEL, block_size: HTSLIB_BLOCK_SIZE }
    }
}

impl CompressionOptions {
    /// Builds validated writer options.
    ///
    /// # Errors
    ///
    /// Returns an error if the level or block size is out of range.
    pub fn writer_options(&self) -> anyhow::Result<WriterOptions> {
        let options = WriterOptions {
            compression_level: self.compression_level,
            block_size: self.block_size,
            ..WriterOptions::default()
        };
        options.validate()?;
        Ok(options)
    }
}
