use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

/// The encoding parameters. Fixed: every job is compressed the same way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeSettings {
    pub video_codec: &'static str,
    pub preset: &'static str,
    pub crf: u8,
    pub audio_codec: &'static str,
    pub audio_bitrate: &'static str,
    pub faststart: bool,
}

pub const ENCODE_SETTINGS: EncodeSettings = EncodeSettings {
    video_codec: "libx264",
    preset: "veryfast",
    crf: 23,
    audio_codec: "aac",
    audio_bitrate: "96k",
    faststart: true,
};

impl EncodeSettings {
    pub(in crate::ffmpeg_wrap) fn to_args(&self, source: &Path, target: &Path) -> Vec<OsString> {
        let crf = self.crf.to_string();
        let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), source.into()];

        args.extend(
            [
                "-c:v",
                self.video_codec,
                "-preset",
                self.preset,
                "-crf",
                crf.as_str(),
                "-c:a",
                self.audio_codec,
                "-b:a",
                self.audio_bitrate,
            ]
            .map(OsString::from),
        );

        if self.faststart {
            args.extend(["-movflags", "faststart"].map(OsString::from));
        }

        args.push(target.into());
        args
    }
}

#[derive(Debug)]
pub struct EncodeOutcome {
    elapsed: Duration,
    exit_code: Option<i32>,
}

impl EncodeOutcome {
    pub(in crate::ffmpeg_wrap) fn new(elapsed: Duration, exit_code: Option<i32>) -> Self {
        Self { elapsed, exit_code }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// `None` when the process was killed by a signal.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MediaInfo {
    size_bytes: u64,
    duration_secs: f64,
}

impl MediaInfo {
    pub(in crate::ffmpeg_wrap) fn new(size_bytes: u64, duration_secs: f64) -> Self {
        Self {
            size_bytes,
            duration_secs,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }
}
