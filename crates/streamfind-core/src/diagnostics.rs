//! Captured-request logs for post-mortem inspection of a traffic sniff.
//!
//! One line per exchange, `METHOD URL -> STATUS` or `METHOD URL -> NO_RESP`.
//! Writing is best effort: a failed write is logged and never changes the
//! outcome of the resolution it describes.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::sniff::CapturedRequest;
use crate::url_model::sanitize_file_stem;

const SHARED_LOG: &str = "debug_requests.log";

/// Receives the full capture of every sniff, whatever its outcome.
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, target: &str, requests: &[CapturedRequest]);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRecorder;

impl DiagnosticsSink for NullRecorder {
    fn record(&self, _target: &str, _requests: &[CapturedRequest]) {}
}

/// Renders the capture as log lines, in arrival order.
pub fn render(requests: &[CapturedRequest]) -> String {
    let mut out = String::new();
    for r in requests {
        out.push_str(&r.to_string());
        out.push('\n');
    }
    out
}

/// Writes captures to files in one directory.
///
/// With `per_target` off every sniff overwrites the single shared log, so it
/// always holds the most recent capture. With it on, each target gets its own
/// file and concurrent resolutions cannot clobber each other.
#[derive(Debug)]
pub struct FileRecorder {
    dir: PathBuf,
    per_target: bool,
    /// Serializes writers to the shared file.
    lock: Mutex<()>,
}

impl FileRecorder {
    pub fn new(dir: impl Into<PathBuf>, per_target: bool) -> Self {
        Self {
            dir: dir.into(),
            per_target,
            lock: Mutex::new(()),
        }
    }

    /// File that `target`'s capture is written to.
    pub fn path_for(&self, target: &str) -> PathBuf {
        if self.per_target {
            self.dir
                .join(format!("debug_requests-{}.log", sanitize_file_stem(target)))
        } else {
            self.dir.join(SHARED_LOG)
        }
    }

    fn write(&self, target: &str, requests: &[CapturedRequest]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create diagnostics dir {}", self.dir.display()))?;
        let path = self.path_for(target);
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());

        // Temp file in the same dir, then rename over the target.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .context("create temp diagnostics file")?;
        tmp.write_all(render(requests).as_bytes())
            .context("write diagnostics")?;
        tmp.persist(&path)
            .map_err(|e| anyhow::anyhow!("persist {}: {}", path.display(), e.error))?;
        Ok(path)
    }
}

impl DiagnosticsSink for FileRecorder {
    fn record(&self, target: &str, requests: &[CapturedRequest]) {
        match self.write(target, requests) {
            Ok(path) => tracing::debug!(
                "wrote {} captured requests for '{}' to {}",
                requests.len(),
                target,
                path.display()
            ),
            Err(e) => tracing::warn!("could not write request log for '{}': {:#}", target, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<CapturedRequest> {
        vec![
            CapturedRequest::new("GET", "https://embed.example.com/ch", Some(200)),
            CapturedRequest::new("GET", "https://cdn.example.com/master.m3u8", None),
        ]
    }

    #[test]
    fn render_lines() {
        assert_eq!(
            render(&sample()),
            "GET https://embed.example.com/ch -> 200\nGET https://cdn.example.com/master.m3u8 -> NO_RESP\n"
        );
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn shared_file_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FileRecorder::new(dir.path(), false);
        recorder.record("Canal 10", &sample());
        recorder.record("Otro", &sample()[..1]);

        let path = dir.path().join("debug_requests.log");
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "GET https://embed.example.com/ch -> 200\n");
        assert_eq!(recorder.path_for("anything"), path);
    }

    #[test]
    fn per_target_files() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FileRecorder::new(dir.path(), true);
        recorder.record("Canal 10 UY", &sample());
        recorder.record("Otro", &[]);

        let a = recorder.path_for("Canal 10 UY");
        assert_eq!(a.file_name().unwrap(), "debug_requests-canal_10_uy.log");
        assert_eq!(std::fs::read_to_string(&a).unwrap().lines().count(), 2);
        assert_eq!(std::fs::read_to_string(recorder.path_for("Otro")).unwrap(), "");
    }

    #[test]
    fn write_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let recorder = FileRecorder::new(blocker.join("logs"), false);
        recorder.record("ch", &sample());
        assert!(recorder.write("ch", &sample()).is_err());
    }
}
