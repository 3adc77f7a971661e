//! External process execution.
//!
//! Every encoder invocation goes through a [`ProcessPipeline`]: one to three
//! stages, optionally joined by anonymous pipes, plus the temp files the
//! stages produce.

mod error;
mod pipeline;

pub use error::ProcessError;
pub use pipeline::{ProcessPipeline, Stage, StageInput, StageOutput, TempFiles, MAX_STAGES};
