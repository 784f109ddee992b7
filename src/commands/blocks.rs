//! List the blocks of a BGZF file.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};

use blockgz_lib::bgzf_io::{create_output, validate_file_exists};
use blockgz_lib::blocks::Blocks;
use blockgz_lib::logging::{OperationTimer, log_compression_summary};

use crate::commands::command::Command;

/// List BGZF blocks.
#[derive(Debug, Parser)]
#[command(
    name = "blocks",
    about = "\x1b[38;5;166m[UTILITIES]\x1b[0m      \x1b[36mList the blocks of a BGZF file\x1b[0m",
    long_about = r#"
List the blocks of a BGZF file.

Writes one tab-separated line per block: the block's file offset, its framed
(compressed) size and its decompressed size. Every block is decoded and checked
against its CRC32, so this doubles as an integrity check. Listing stops after the
first empty block, which marks the end of the stream.

Example usage:
  blockgz blocks -i reads.sam.gz
  blockgz blocks -i reads.sam.gz -o blocks.tsv
"#
)]
pub struct ListBlocks {
    /// Input BGZF file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output file, or `-` for standard output
    #[arg(short = 'o', long = "output", default_value = "-")]
    pub output: PathBuf,
}

impl Command for ListBlocks {
    fn execute(&self, command_line: &str) -> Result<()> {
        debug!("Command line: {command_line}");
        validate_file_exists(&self.input, "Input BGZF file")?;
        info!("Input: {}", self.input.display());

        let timer = OperationTimer::new("Listing blocks");
        let file = File::open(&self.input)
            .with_context(|| format!("Failed to open {}", self.input.display()))?;
        let mut output = create_output(&self.output)?;

        let mut blocks = 0u64;
        let mut compressed = 0u64;
        let mut uncompressed = 0u64;
        let mut terminated = false;
        for block in Blocks::new(BufReader::new(file)) {
            let block = block.with_context(|| format!("Failed to read {}", self.input.display()))?;
            writeln!(output, "{}\t{}\t{}", block.start_offset, block.framed_size, block.data.len())?;
            blocks += 1;
            compressed += block.framed_size as u64;
            uncompressed += block.data.len() as u64;
            terminated = block.is_terminator();
        }
        output.flush()?;

        if !terminated {
            warn!("{} has no terminating empty block", self.input.display());
        }
        log_compression_summary(uncompressed, compressed, blocks);
        timer.log_completion(compressed);
        Ok(())
    }
}
