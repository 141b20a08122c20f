use std::path::Path;
use std::process::Stdio;

use futures_util::stream::{self, Select};
use futures_util::StreamExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::time::Instant;
use tokio_util::codec::FramedRead;

use crate::error::{CompressError, Result};
use crate::progress;

mod codec;
#[cfg(all(test, unix))]
pub(crate) mod fake;
mod model;

pub use codec::OutputLineCodec;
pub use model::{EncodeOutcome, EncodeSettings, MediaInfo, ENCODE_SETTINGS};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

type OutputLines = Select<
    FramedRead<ChildStdout, OutputLineCodec>,
    FramedRead<ChildStderr, OutputLineCodec>,
>;

fn ffmpeg_command(program: &Path) -> Command {
    let mut cmd = Command::new(program);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);

    cmd
}

/// A running ffmpeg encode. Output is read line by line while the process
/// runs; stdout and stderr are merged.
pub struct EncoderProcess {
    child: Child,
    lines: OutputLines,
    started: Instant,
}

impl EncoderProcess {
    pub fn spawn(
        program: &Path,
        source: &Path,
        target: &Path,
        settings: &EncodeSettings,
    ) -> Result<Self> {
        let args = settings.to_args(source, target);
        tracing::debug!("running {} {:?}", program.display(), args);

        let started = Instant::now();
        let mut child = ffmpeg_command(program)
            .args(&args)
            .spawn()
            .map_err(|e| {
                CompressError::EncodingFailed(format!("cannot start {}: {e}", program.display()))
            })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(CompressError::EncodingFailed(
                "encoder output is not captured".to_string(),
            ));
        };

        let lines = stream::select(
            FramedRead::new(stdout, OutputLineCodec),
            FramedRead::new(stderr, OutputLineCodec),
        );

        Ok(Self {
            child,
            lines,
            started,
        })
    }

    pub async fn next_line(&mut self) -> Result<Option<String>> {
        self.lines
            .next()
            .await
            .transpose()
            .map_err(|e| CompressError::EncodingFailed(format!("cannot read encoder output: {e}")))
    }

    pub async fn wait(mut self) -> Result<EncodeOutcome> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| CompressError::EncodingFailed(format!("cannot wait for encoder: {e}")))?;

        tracing::debug!("encoder exited with {status}");

        Ok(EncodeOutcome::new(self.started.elapsed(), status.code()))
    }
}

pub async fn probe_media(program: &Path, source: &Path) -> Result<MediaInfo> {
    let metadata = tokio::fs::metadata(source)
        .await
        .map_err(|_| CompressError::FileNotFound(source.to_path_buf()))?;

    if !metadata.is_file() {
        return Err(CompressError::FileNotFound(source.to_path_buf()));
    }

    let probe_failed = |reason: String| CompressError::ProbeFailed {
        path: source.to_path_buf(),
        reason,
    };

    // ffmpeg exits non-zero here since no output is given; only the header matters.
    let output = ffmpeg_command(program)
        .arg("-hide_banner")
        .arg("-i")
        .arg(source)
        .output()
        .await
        .map_err(|e| probe_failed(format!("cannot start {}: {e}", program.display())))?;

    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );

    let duration_secs = text
        .lines()
        .find(|line| line.contains(progress::DURATION_MARKER))
        .and_then(progress::parse_duration_line)
        .ok_or_else(|| probe_failed("no duration in encoder output".to_string()))?;

    Ok(MediaInfo::new(metadata.len(), duration_secs))
}
