use std::time::Duration;

use crate::encoder::CompressionResult;
use crate::error::{CompressError, Result};

const BYTES_PER_MB: f64 = 1_048_576.0;

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// How much smaller the compressed file is, in percent of the original.
/// Negative when the output grew.
pub fn compression_percent(original_size: u64, compressed_size: u64) -> Option<f64> {
    if original_size == 0 {
        return None;
    }

    Some((original_size as f64 - compressed_size as f64) * 100.0 / original_size as f64)
}

/// `"<m>m <s>s"`, whole minutes and seconds.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}

/// Media duration as `h:mm:ss`, or `m:ss` under an hour.
pub fn format_clock(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    let (h, m, s) = (total / 3600, total % 3600 / 60, total % 60);

    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompressionStats {
    pub percent: f64,
    pub compressed_mb: f64,
    pub elapsed: Duration,
}

impl CompressionStats {
    pub fn from_result(result: &CompressionResult) -> Result<Self> {
        let original = result
            .original_size()
            .ok_or_else(|| CompressError::StatsUnavailable("original file is missing".into()))?;
        let compressed = result
            .compressed_size()
            .ok_or_else(|| CompressError::StatsUnavailable("compressed file is missing".into()))?;
        let percent = compression_percent(original, compressed)
            .ok_or_else(|| CompressError::StatsUnavailable("original file is empty".into()))?;

        Ok(Self {
            percent,
            compressed_mb: bytes_to_mb(compressed),
            elapsed: result.elapsed(),
        })
    }
}

impl std::fmt::Display for CompressionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Compression complete: {:.2}%", self.percent)?;
        writeln!(f, "New file size: {:.2} MB", self.compressed_mb)?;
        write!(f, "Compression time: {}", format_elapsed(self.elapsed))
    }
}
