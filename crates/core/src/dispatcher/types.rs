//! Types for the dispatcher module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which tool flavour a run emulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Transcode to lossy audio and images; copy already-lossy media.
    Lossy,
    /// Transcode to lossless audio and images; rewrite cue sheets.
    Lossless,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lossy => "lossy",
            Self::Lossless => "lossless",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with a matched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerCategory {
    Audio,
    Image,
    Copy,
}

/// One failed file or track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub source: PathBuf,
    /// Cue track number when a single track failed.
    pub track: Option<u32>,
    pub error: String,
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.track {
            Some(track) => write!(f, "{} (track {:02}): {}", self.source.display(), track, self.error),
            None => write!(f, "{}: {}", self.source.display(), self.error),
        }
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Files that matched a handler and became jobs.
    pub jobs: usize,
    /// Per-track sub-jobs derived from cue sheets.
    pub track_jobs: usize,
    /// Jobs that finished without any failure.
    pub succeeded: usize,
    /// Files with no handler (and cue sheets in lossless mode).
    pub skipped: usize,
    pub failures: Vec<JobFailure>,
    /// Whether the run was interrupted.
    pub cancelled: bool,
}

impl RunSummary {
    /// True when every job succeeded and the run was not interrupted.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    pub(crate) fn absorb(&mut self, report: JobReport) {
        self.track_jobs += report.track_jobs;
        if report.failures.is_empty() && !report.cancelled {
            self.succeeded += 1;
        }
        self.failures.extend(report.failures);
    }
}

/// Result of one spawned job.
#[derive(Debug, Default)]
pub(crate) struct JobReport {
    pub track_jobs: usize,
    pub failures: Vec<JobFailure>,
    pub cancelled: bool,
}

impl JobReport {
    pub fn failed(&mut self, source: PathBuf, track: Option<u32>, error: impl fmt::Display) {
        self.failures.push(JobFailure {
            source,
            track,
            error: error.to_string(),
        });
    }
}

/// Errors that stop a run before any job starts.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Source root is missing or not a directory.
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    /// Destination would be walked as part of the source.
    #[error("Destination {dest} is inside source {source_root}")]
    DestinationInsideSource { dest: PathBuf, source_root: PathBuf },

    /// Destination root could not be created.
    #[error("Failed to prepare destination {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
