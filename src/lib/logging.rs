//! Formatting helpers for progress and summary logging.
//!
//! The command-line tools report sizes, throughput and compression ratios through `log`;
//! these helpers keep that output consistent.

use std::time::{Duration, Instant};

/// Formats a count with thousands separators.
///
/// # Examples
///
/// ```
/// use blockgz_lib::logging::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a byte count using binary units.
///
/// # Examples
///
/// ```
/// use blockgz_lib::logging::format_bytes;
///
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(65536), "64.0 KiB");
/// assert_eq!(format_bytes(3 * 1024 * 1024 / 2), "1.5 MiB");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Formats a fraction as a percentage with `decimals` places.
///
/// # Examples
///
/// ```
/// use blockgz_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// assert_eq!(format_percent(1.0, 0), "100%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0, decimals = decimals)
}

/// Formats a duration in human-readable form (e.g. "45s", "2m 15s", "1h 30m").
///
/// # Examples
///
/// ```
/// use blockgz_lib::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(135)), "2m 15s");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let mins = secs / 60;
        let remaining_secs = secs % 60;
        if remaining_secs == 0 { format!("{mins}m") } else { format!("{mins}m {remaining_secs}s") }
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Formats throughput for `bytes` processed over `duration`.
///
/// # Examples
///
/// ```
/// use blockgz_lib::logging::format_throughput;
/// use std::time::Duration;
///
/// assert_eq!(format_throughput(2048, Duration::from_secs(2)), "1.0 KiB/s");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_throughput(bytes: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{}/s", format_bytes(bytes));
    }
    format!("{}/s", format_bytes((bytes as f64 / secs) as u64))
}

/// Logs sizes and ratio after compressing or decompressing a stream.
#[allow(clippy::cast_precision_loss)]
pub fn log_compression_summary(uncompressed: u64, compressed: u64, blocks: u64) {
    log::info!("Compression Summary:");
    log::info!("  Uncompressed: {} ({} bytes)", format_bytes(uncompressed), format_count(uncompressed));
    log::info!("  Compressed: {} ({} bytes)", format_bytes(compressed), format_count(compressed));
    log::info!("  Blocks: {}", format_count(blocks));
    if uncompressed > 0 {
        log::info!("  Ratio: {}", format_percent(compressed as f64 / uncompressed as f64, 2));
    }
}

/// Operation timing helper.
///
/// # Examples
///
/// ```no_run
/// use blockgz_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Compressing");
/// // ... do work ...
/// timer.log_completion(1 << 20);
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Creates a new operation timer and logs the start.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    /// Logs completion with the number of bytes processed and the throughput.
    pub fn log_completion(&self, bytes: u64) {
        let duration = self.start_time.elapsed();
        log::info!(
            "{} completed: {} in {} ({})",
            self.operation,
            format_bytes(bytes),
            format_duration(duration),
            format_throughput(bytes, duration)
        );
    }
}
