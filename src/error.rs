use std::path::PathBuf;

/// Every failure a compression run can hit. None of these are fatal: the
/// caller prints the message and moves on to the next file.
#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Cannot read media info from {}: {reason}", path.display())]
    ProbeFailed { path: PathBuf, reason: String },

    #[error("Error compressing video: {0}")]
    EncodingFailed(String),

    #[error("Cannot compute compression statistics: {0}")]
    StatsUnavailable(String),
}

pub type Result<T, E = CompressError> = std::result::Result<T, E>;
