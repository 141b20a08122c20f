use std::path::{Path, PathBuf};

use directories::UserDirs;
use normpath::PathExt;
use tokio::sync::mpsc;

use crate::error::{CompressError, Result};
use crate::ffmpeg_wrap::EncoderProcess;
use crate::progress::ProgressTracker;

mod model;
pub use model::{CompressionJob, CompressionResult, JobEvent};

const EVENT_CHANNEL_CAPACITY: usize = 16;

pub fn output_dir() -> PathBuf {
    match UserDirs::new() {
        Some(dirs) => dirs
            .desktop_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dirs.home_dir().join("Desktop")),
        None => PathBuf::from("Desktop"),
    }
}

/// Drops wrap paths containing spaces in braces. The result is absolute and,
/// on Windows, free of the `\\?\` verbatim prefix.
pub fn normalize_source_path(raw: &str) -> Result<PathBuf> {
    let cleaned = raw.replace(['{', '}'], "");
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return Err(CompressError::FileNotFound(PathBuf::new()));
    }

    let not_found = || CompressError::FileNotFound(PathBuf::from(cleaned));

    let path = Path::new(cleaned)
        .normalize()
        .map_err(|_| not_found())?
        .into_path_buf();

    if !path.exists() {
        return Err(not_found());
    }

    Ok(path)
}

/// Intermediate updates are dropped when the channel is full; the final
/// 100% is always delivered.
pub async fn run_job(
    job: &CompressionJob,
    program: &Path,
    events: &mpsc::Sender<JobEvent>,
) -> Result<CompressionResult> {
    let is_file = tokio::fs::metadata(job.source())
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);

    if !is_file {
        return Err(CompressError::FileNotFound(job.source().to_path_buf()));
    }

    if let Some(dir) = job.target().parent() {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            CompressError::EncodingFailed(format!("cannot create {}: {e}", dir.display()))
        })?;
    }

    let mut process = EncoderProcess::spawn(program, job.source(), job.target(), job.settings())?;
    let mut tracker = ProgressTracker::new();

    while let Some(line) = process.next_line().await? {
        if let Some(percent) = tracker.feed_line(&line) {
            let _ = events.try_send(JobEvent::Progress(percent));
        }
    }

    tracing::debug!(
        total_secs = ?tracker.total_secs(),
        last_secs = ?tracker.current_secs(),
        "encoder output closed"
    );

    let outcome = process.wait().await?;

    if !outcome.success() {
        let reason = match outcome.exit_code() {
            Some(code) => format!("ffmpeg exited with code {code}"),
            None => "ffmpeg was terminated by a signal".to_string(),
        };
        tracing::warn!("{}: {reason}", job.source().display());

        return Err(CompressError::EncodingFailed(reason));
    }

    let _ = events.send(JobEvent::Progress(100.0)).await;

    Ok(CompressionResult::new(
        outcome.elapsed(),
        file_size(job.source()).await,
        file_size(job.target()).await,
    ))
}

async fn file_size(path: &Path) -> Option<u64> {
    tokio::fs::metadata(path).await.ok().map(|m| m.len())
}

/// Starts `job` on a background task. The receiver yields progress and ends
/// with exactly one [`JobEvent::Finished`].
pub fn spawn_job(job: CompressionJob, program: PathBuf) -> mpsc::Receiver<JobEvent> {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let result = run_job(&job, &program, &tx).await;
        let _ = tx.send(JobEvent::Finished(result)).await;
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_name() {
        let job = CompressionJob::new(PathBuf::from("video.mp4"), Path::new("/home/me/Desktop"))
            .unwrap();

        assert_eq!(job.target(), Path::new("/home/me/Desktop/c_video.mp4"));
        assert_eq!(job.target().file_name().unwrap(), "c_video.mp4");
    }

    #[test]
    fn test_destination_keeps_extension() {
        let job =
            CompressionJob::new(PathBuf::from("/videos/holiday clip.MOV"), Path::new("/out"))
                .unwrap();

        assert_eq!(job.target(), Path::new("/out/c_holiday clip.MOV"));
    }

    #[test]
    fn test_destination_needs_file_name() {
        let result = CompressionJob::new(PathBuf::from("/"), Path::new("/out"));

        assert!(matches!(result, Err(CompressError::FileNotFound(_))));
    }

    #[test]
    fn test_normalize_missing_path() {
        let result = normalize_source_path("{/nonexistent/my video.mp4}");

        assert!(
            matches!(result, Err(CompressError::FileNotFound(p)) if p == Path::new("/nonexistent/my video.mp4"))
        );
    }

    #[test]
    fn test_normalize_empty_path() {
        let result = normalize_source_path("  {} ");

        assert!(matches!(result, Err(CompressError::FileNotFound(_))));
    }

    #[test]
    fn test_normalize_braced_drop() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("my video.mp4");
        std::fs::write(&source, b"data").unwrap();

        let raw = format!(" {{{}}} ", source.display());
        let normalized = normalize_source_path(&raw).unwrap();

        assert!(normalized.is_absolute());
        assert!(normalized.ends_with("my video.mp4"));
    }

    #[cfg(unix)]
    mod with_fake_ffmpeg {
        use std::time::Duration;

        use super::*;
        use crate::ffmpeg_wrap::fake::{FakeFfmpeg, OUTPUT_BYTES};

        const ENCODE_LOG: &str = "Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'video.mp4':\n  \
            Duration: 00:00:10.00, start: 0.000000, bitrate: 800 kb/s\n\
            frame=  10 fps=0.0 q=0.0 size=       0kB time=00:00:02.50 bitrate=N/A speed=5x\r\
            frame=  20 fps=0.0 q=0.0 size=     128kB time=00:00:09.00 bitrate=N/A speed=5x\r\
            frame=  21 fps=0.0 q=0.0 Lsize=     130kB time=00:00:09.96 bitrate=N/A speed=5x\n";

        fn drain(rx: &mut mpsc::Receiver<JobEvent>) -> Vec<f64> {
            let mut progress = vec![];
            while let Ok(event) = rx.try_recv() {
                if let JobEvent::Progress(p) = event {
                    progress.push(p);
                }
            }
            progress
        }

        #[tokio::test]
        async fn test_success_forces_full_progress() {
            let fake = FakeFfmpeg::new(ENCODE_LOG, 0);
            let source = fake.source(100);
            let job = CompressionJob::new(source, &fake.dir().join("out")).unwrap();
            let (tx, mut rx) = mpsc::channel(64);

            let result = run_job(&job, fake.program(), &tx).await.unwrap();
            let progress = drain(&mut rx);

            assert_eq!(progress.first(), Some(&25.0));
            assert_eq!(progress.last(), Some(&100.0));
            assert_eq!(progress.len(), 4);
            assert_eq!(result.original_size(), Some(100));
            assert_eq!(result.compressed_size(), Some(OUTPUT_BYTES));
            assert!(result.elapsed() > Duration::ZERO);
            assert!(job.target().exists());
        }

        #[tokio::test]
        async fn test_failure_reports_encoding_failed() {
            let fake = FakeFfmpeg::new(ENCODE_LOG, 1);
            let source = fake.source(100);
            let job = CompressionJob::new(source, fake.dir()).unwrap();
            let (tx, mut rx) = mpsc::channel(64);

            let result = run_job(&job, fake.program(), &tx).await;
            let progress = drain(&mut rx);

            assert!(matches!(result, Err(CompressError::EncodingFailed(_))));
            assert_eq!(progress.len(), 3);
            assert!(progress.iter().all(|p| *p < 100.0));
        }

        #[tokio::test]
        async fn test_missing_source_launches_nothing() {
            let fake = FakeFfmpeg::new(ENCODE_LOG, 0);
            let job = CompressionJob::new(fake.dir().join("gone.mp4"), fake.dir()).unwrap();
            let (tx, mut rx) = mpsc::channel(64);

            let result = run_job(&job, fake.program(), &tx).await;

            assert!(matches!(result, Err(CompressError::FileNotFound(_))));
            assert!(!fake.was_invoked());
            assert!(drain(&mut rx).is_empty());
        }

        #[tokio::test]
        async fn test_no_progress_without_duration() {
            let fake = FakeFfmpeg::new(
                "frame=  10 time=00:00:02.50 speed=5x\rframe=  20 time=00:00:05.00 speed=5x\n",
                0,
            );
            let source = fake.source(100);
            let job = CompressionJob::new(source, &fake.dir().join("out")).unwrap();
            let (tx, mut rx) = mpsc::channel(64);

            run_job(&job, fake.program(), &tx).await.unwrap();

            assert_eq!(drain(&mut rx), vec![100.0]);
        }

        #[tokio::test]
        async fn test_spawned_job_ends_with_finished() {
            let fake = FakeFfmpeg::new(ENCODE_LOG, 0);
            let source = fake.source(100);
            let job = CompressionJob::new(source, &fake.dir().join("out")).unwrap();

            let mut rx = spawn_job(job, fake.program().to_path_buf());

            let mut last_progress = None;
            let mut finished = None;
            while let Some(event) = rx.recv().await {
                match event {
                    JobEvent::Progress(p) => last_progress = Some(p),
                    JobEvent::Finished(result) => finished = Some(result),
                }
            }

            assert_eq!(last_progress, Some(100.0));
            assert!(matches!(finished, Some(Ok(_))));
        }
    }
}
