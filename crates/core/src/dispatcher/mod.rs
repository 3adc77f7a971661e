//! Directory walker and job dispatcher.
//!
//! The dispatcher enumerates the source tree on a blocking thread, maps each
//! file's lower-cased extension to a handler category for the run's
//! [`Mode`], and spawns one task per matched file. All transcoding and
//! copying draws from a single [`crate::pool::WorkerPool`], including the
//! per-track jobs of cue-split files.

mod copy;
mod handlers;
mod scheduler;
mod types;

pub use copy::{copy_file, rewrite_cue};
pub use handlers::{
    HandlerTable, AUDIO_EXTENSIONS, CUE_EXTENSION, IMAGE_EXTENSIONS, LOSSY_COPY_EXTENSIONS,
};
pub use scheduler::Dispatcher;
pub use types::{DispatchError, HandlerCategory, JobFailure, Mode, RunSummary};
