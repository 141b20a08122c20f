//! Scrapes ffmpeg's human-readable diagnostics for the media duration and the
//! current encode position.
//!
//! ffmpeg prints the input duration once in its header
//! (`  Duration: 00:01:02.50, start: 0.000000, bitrate: 1205 kb/s`) and then
//! keeps rewriting a stats line
//! (`frame=  120 fps= 60 q=28.0 size=     256kB time=00:00:04.96 bitrate= 422.5kbits/s speed=2.4x`).

pub const DURATION_MARKER: &str = "Duration: ";
pub const TIME_MARKER: &str = "time=";

/// Converts `HH:MM:SS[.fraction]` into seconds.
///
/// Returns `None` for anything that is not exactly three numeric,
/// colon-separated components.
pub fn parse_timestamp(text: &str) -> Option<f64> {
    let mut parts = text.trim().split(':');

    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let component = |v: &str| v.parse::<f64>().ok().filter(|v| v.is_finite());

    Some(component(h)? * 3600.0 + component(m)? * 60.0 + component(s)?)
}

/// Total duration in seconds from a line carrying [`DURATION_MARKER`].
pub fn parse_duration_line(line: &str) -> Option<f64> {
    let (_, rest) = line.split_once(DURATION_MARKER)?;
    let text = rest.split(',').next().unwrap_or_default();

    let secs = parse_timestamp(text);
    if secs.is_none() {
        tracing::debug!("unparsable duration {text:?}");
    }

    secs
}

/// Current encode position in seconds from a line carrying [`TIME_MARKER`].
pub fn parse_time_line(line: &str) -> Option<f64> {
    let (_, rest) = line.split_once(TIME_MARKER)?;
    let text = rest.split_whitespace().next().unwrap_or_default();

    let secs = parse_timestamp(text);
    if secs.is_none() {
        tracing::debug!("unparsable time {text:?}");
    }

    secs
}

/// Per-job progress state, fed one output line at a time.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    total_secs: Option<f64>,
    current_secs: Option<f64>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_secs(&self) -> Option<f64> {
        self.total_secs
    }

    pub fn current_secs(&self) -> Option<f64> {
        self.current_secs
    }

    /// Percentage done, clamped to `0..=100`. Unknown until a non-zero
    /// duration and a position have both been seen.
    pub fn percentage(&self) -> Option<f64> {
        let total = self.total_secs.filter(|t| *t > 0.0)?;
        let current = self.current_secs?;

        Some((current / total * 100.0).clamp(0.0, 100.0))
    }

    /// Consumes one line and returns a new percentage if the line moved the
    /// encode position while the duration is known.
    ///
    /// The first parsable duration wins; later duration lines are ignored.
    pub fn feed_line(&mut self, line: &str) -> Option<f64> {
        if self.total_secs.is_none() && line.contains(DURATION_MARKER) {
            self.total_secs = parse_duration_line(line);
            return None;
        }

        if !line.contains(TIME_MARKER) {
            return None;
        }

        self.current_secs = Some(parse_time_line(line)?);
        self.percentage()
    }
}
