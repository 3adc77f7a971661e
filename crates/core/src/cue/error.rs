//! Error types for cue sheet loading and parsing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or parsing a cue sheet.
#[derive(Debug, Error)]
pub enum CueError {
    /// The cue file could not be read.
    #[error("Failed to read cue file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// None of the candidate encodings decoded the file.
    #[error("Failed to decode cue file {path} with any candidate encoding")]
    Undecodable { path: PathBuf },

    /// A directive was recognized but has no handler in the current state.
    #[error("Unexpected {directive} directive in {state} section (line {line})")]
    UnexpectedDirective {
        state: &'static str,
        directive: &'static str,
        line: usize,
    },

    /// A track-level directive appeared before the first TRACK.
    #[error("{directive} directive before any TRACK (line {line})")]
    NoCurrentTrack { directive: &'static str, line: usize },

    /// TRACK numbers must run 1, 2, 3, ... in order.
    #[error("Inconsistent track number: expected {expected}, found {found} (line {line})")]
    TrackOutOfSequence {
        expected: u32,
        found: u32,
        line: usize,
    },

    /// INDEX position was not `mm:ss:ff`.
    #[error("Invalid index timestamp '{value}' (line {line})")]
    InvalidTimestamp { value: String, line: usize },

    /// A track never received an `INDEX 01`.
    #[error("Track {index} has no INDEX 01")]
    MissingStart { index: u32 },
}
