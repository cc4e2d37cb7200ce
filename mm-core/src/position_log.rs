//! Append-only position log: one line per position-detection, unwind
//! attempt, and unwind outcome. Grounded on the teacher's
//! `execution::journal::AsyncJournal` (append-only writer with a stable
//! path), simplified to synchronous line-based text per the persisted
//! artefact described for this crate — there's no recovery/replay reader
//! counterpart here, so the background-thread/channel machinery the
//! teacher's binary journal needs has no job to do.

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

pub struct PositionLog {
    path: PathBuf,
}

impl PositionLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Appends one line: `[<local timestamp>] <message>`. Failures are
    /// logged via `tracing` and otherwise swallowed — a missing log line
    /// must never interrupt the control loop.
    pub fn append(&self, message: &str) {
        let line = format!("[{}] {}\n", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"), message);
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| f.write_all(line.as_bytes()));
        if let Err(err) = result {
            warn!(path = %self.path.display(), %err, "failed to append to position log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn append_creates_file_and_writes_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("position.log");
        let log = PositionLog::new(&path);
        log.append("position detected: long 0.002 BTC");
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("position detected: long 0.002 BTC"));
    }

    #[test]
    fn append_is_additive_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("position.log");
        let log = PositionLog::new(&path);
        log.append("first");
        log.append("second");
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
