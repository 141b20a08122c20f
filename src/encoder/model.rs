use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CompressError, Result};
use crate::ffmpeg_wrap::{EncodeSettings, ENCODE_SETTINGS};

pub const OUTPUT_PREFIX: &str = "c_";

#[derive(Clone, Debug)]
pub struct CompressionJob {
    source: PathBuf,
    target: PathBuf,
    settings: EncodeSettings,
}

impl CompressionJob {
    /// The destination is `output_dir/c_<source file name>`.
    pub fn new(source: PathBuf, output_dir: &Path) -> Result<Self> {
        let Some(file_name) = source.file_name() else {
            return Err(CompressError::FileNotFound(source));
        };

        let mut target_name = OUTPUT_PREFIX.to_string();
        target_name.push_str(&file_name.to_string_lossy());

        Ok(Self {
            target: output_dir.join(target_name),
            source,
            settings: ENCODE_SETTINGS,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn settings(&self) -> &EncodeSettings {
        &self.settings
    }
}

#[derive(Debug)]
pub enum JobEvent {
    /// Percent done, `0.0..=100.0`.
    Progress(f64),
    Finished(Result<CompressionResult>),
}

/// A job that ran to a zero exit code. File sizes are whatever could be read
/// right after the encoder exited.
#[derive(Clone, Debug)]
pub struct CompressionResult {
    elapsed: Duration,
    original_size: Option<u64>,
    compressed_size: Option<u64>,
}

impl CompressionResult {
    pub(crate) fn new(
        elapsed: Duration,
        original_size: Option<u64>,
        compressed_size: Option<u64>,
    ) -> Self {
        Self {
            elapsed,
            original_size,
            compressed_size,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn original_size(&self) -> Option<u64> {
        self.original_size
    }

    pub fn compressed_size(&self) -> Option<u64> {
        self.compressed_size
    }
}
