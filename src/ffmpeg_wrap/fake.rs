//! A stand-in ffmpeg for tests: a shell script that replays canned
//! diagnostics on stderr, writes a dummy output file when encoding and exits
//! with a chosen code.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub(crate) const OUTPUT_BYTES: u64 = 40;

pub(crate) struct FakeFfmpeg {
    dir: TempDir,
    program: PathBuf,
}

impl FakeFfmpeg {
    pub(crate) fn new(stderr: &str, exit_code: i32) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("stderr.log");
        let marker = dir.path().join("invoked");
        let program = dir.path().join("ffmpeg");

        fs::write(&log, stderr).unwrap();
        fs::write(
            &program,
            format!(
                "#!/bin/sh\n\
                 touch '{marker}'\n\
                 cat '{log}' >&2\n\
                 if [ \"$1\" = \"-y\" ]; then\n\
                 \tfor last; do :; done\n\
                 \thead -c {OUTPUT_BYTES} /dev/zero > \"$last\"\n\
                 fi\n\
                 exit {exit_code}\n",
                marker = marker.display(),
                log = log.display(),
            ),
        )
        .unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();

        Self { dir, program }
    }

    pub(crate) fn program(&self) -> &Path {
        &self.program
    }

    pub(crate) fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Creates a source video of `size` bytes.
    pub(crate) fn source(&self, size: usize) -> PathBuf {
        let path = self.dir.path().join("video.mp4");
        fs::write(&path, vec![0u8; size]).unwrap();
        path
    }

    pub(crate) fn was_invoked(&self) -> bool {
        self.dir.path().join("invoked").exists()
    }
}
