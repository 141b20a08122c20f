use std::io;

use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// Splits ffmpeg output into lines. The stats line is redrawn with `\r`
/// rather than `\n`, so both terminate a line. Blank lines are skipped.
#[derive(Debug, Default)]
pub struct OutputLineCodec;

impl Decoder for OutputLineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, io::Error> {
        while let Some(end) = buf.iter().position(|b| *b == b'\n' || *b == b'\r') {
            let line = buf.split_to(end + 1);
            let line = String::from_utf8_lossy(&line[..end]).trim().to_string();

            if !line.is_empty() {
                return Ok(Some(line));
            }
        }

        Ok(None)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, io::Error> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }

        if buf.is_empty() {
            return Ok(None);
        }

        let rest = buf.split();
        let line = String::from_utf8_lossy(&rest).trim().to_string();

        Ok((!line.is_empty()).then_some(line))
    }
}
