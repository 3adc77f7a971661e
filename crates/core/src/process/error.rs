//! Error types for external process execution.

use thiserror::Error;

/// Errors raised while running a [`ProcessPipeline`](super::ProcessPipeline).
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The executable could not be started.
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A stage exited unsuccessfully.
    #[error("{program} exited with {}", describe_code(.code))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: Option<String>,
    },

    /// Stage stdin/stdout declarations do not line up.
    #[error("Invalid pipeline wiring: {0}")]
    InvalidWiring(String),

    /// I/O error while waiting on a stage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The run was cancelled; children were killed.
    #[error("Process cancelled")]
    Cancelled,
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}
