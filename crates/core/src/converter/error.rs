//! Error types for the converter module.

use thiserror::Error;

use crate::cue::CueError;
use crate::paths::PathError;
use crate::pool::PoolError;
use crate::process::ProcessError;

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// An external tool could not be started.
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external tool exited unsuccessfully.
    #[error("{program} failed with {}", describe_exit(.code))]
    ProcessFailed {
        program: String,
        code: Option<i32>,
        stderr: Option<String>,
    },

    /// Stage wiring or pipe setup failed.
    #[error("Process error: {0}")]
    Process(ProcessError),

    /// Destination path could not be resolved.
    #[error(transparent)]
    Path(#[from] PathError),

    /// Companion cue sheet could not be loaded or parsed.
    #[error("Cue sheet error: {0}")]
    Cue(#[from] CueError),

    /// ffprobe produced no usable output.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// Failed to parse ffprobe output.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    /// The converter cannot perform the requested operation.
    #[error("Unsupported operation: {reason}")]
    Unsupported { reason: String },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Job was cancelled.
    #[error("Conversion cancelled")]
    Cancelled,
}

impl ConverterError {
    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    /// Creates a new unsupported operation error.
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported {
            reason: reason.into(),
        }
    }

    /// Whether this error came from cancellation rather than a real failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<ProcessError> for ConverterError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Spawn { program, source } => Self::Spawn { program, source },
            ProcessError::Failed {
                program,
                code,
                stderr,
            } => Self::ProcessFailed {
                program,
                code,
                stderr,
            },
            ProcessError::Cancelled => Self::Cancelled,
            other => Self::Process(other),
        }
    }
}

impl From<PoolError> for ConverterError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Cancelled => Self::Cancelled,
            PoolError::Closed => Self::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                err.to_string(),
            )),
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code".to_string(),
    }
}
