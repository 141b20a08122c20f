use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use indicatif::ProgressStyle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod encoder;
use encoder::{CompressionJob, JobEvent};

mod error;
mod ffmpeg_wrap;
mod progress;
mod stats;

use crate::error::CompressError;
use crate::stats::CompressionStats;

/// Re-encode videos into smaller MP4s on your Desktop.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Video files to compress, one after another.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// ffmpeg executable.
    #[arg(long, env = "FFMPEG_PATH", default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Only show size and duration.
    #[arg(long)]
    info_only: bool,
}

fn generate_encode_progress_bar() -> indicatif::ProgressBar {
    let pb = indicatif::ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}%",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );

    pb
}

async fn compress_file(raw_path: &str, args: &Args) -> Result<(), CompressError> {
    let source = encoder::normalize_source_path(raw_path)?;
    let info = ffmpeg_wrap::probe_media(&args.ffmpeg, &source).await?;

    println!("{}", source.display());
    println!("File size: {:.2} MB", stats::bytes_to_mb(info.size_bytes()));
    println!("Duration: {}", stats::format_clock(info.duration_secs()));

    if args.info_only {
        return Ok(());
    }

    let job = CompressionJob::new(source, &encoder::output_dir())?;
    println!("Compressing to {}...", job.target().display());

    let pb = generate_encode_progress_bar();
    let mut rx = encoder::spawn_job(job, args.ffmpeg.clone());

    let mut finished = None;
    while let Some(event) = rx.recv().await {
        match event {
            JobEvent::Progress(percent) => pb.set_position(percent as u64),
            JobEvent::Finished(result) => finished = Some(result),
        }
    }

    let result = finished.unwrap_or_else(|| {
        Err(CompressError::EncodingFailed(
            "worker stopped without a result".to_string(),
        ))
    });

    match result {
        Ok(result) => {
            pb.finish();
            println!("{}", CompressionStats::from_result(&result)?);
            Ok(())
        }
        Err(e) => {
            pb.abandon();
            Err(e)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mp4_compressor=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut failed = 0;
    for raw_path in &args.inputs {
        if let Err(e) = compress_file(raw_path, &args).await {
            tracing::debug!("{raw_path}: {e:?}");
            eprintln!("{e}");
            failed += 1;
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} file(s) failed", args.inputs.len());
    }

    Ok(())
}
