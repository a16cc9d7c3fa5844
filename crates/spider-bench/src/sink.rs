use std::fs;
use std::path::{Path, PathBuf};

use spider_core::game::{SinkError, Submission, SubmissionSink};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

/// Writes each submission as `session-<timestamp>.json` under one directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far, oldest first.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn target_path(&self, timestamp: &str) -> PathBuf {
        let stem = format!("session-{}", file_safe(timestamp));
        let mut path = self.dir.join(format!("{stem}.json"));
        let mut suffix = 1;
        while path.exists() {
            path = self.dir.join(format!("{stem}-{suffix}.json"));
            suffix += 1;
        }
        path
    }
}

impl SubmissionSink for DirectorySink {
    fn submit(&mut self, submission: &Submission) -> Result<(), SinkError> {
        fs::create_dir_all(&self.dir).map_err(|source| SinkError::Io {
            context: format!("creating submission directory {}", self.dir.display()),
            source,
        })?;

        let path = self.target_path(&submission.timestamp);
        let body = submission.to_json()?;
        fs::write(&path, body).map_err(|source| SinkError::Io {
            context: format!("writing submission {}", path.display()),
            source,
        })?;
        self.written.push(path);
        Ok(())
    }
}

/// Current UTC time in RFC 3339, the timestamp format submissions carry.
pub fn timestamp_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string())
}

/// Hands `submission` to `sink`, logging instead of failing.
pub fn submit_or_warn(sink: &mut dyn SubmissionSink, submission: &Submission) -> bool {
    match sink.submit(submission) {
        Ok(()) => true,
        Err(err) => {
            warn!(target: "spider_bench::sink", error = %err, "submission failed");
            false
        }
    }
}

fn file_safe(timestamp: &str) -> String {
    timestamp.replace([':', '.'], "-")
}
