//! Cue sheet loading and parsing.
//!
//! A cue sheet describes how one audio file is split into tracks. Loading
//! deals with legacy encodings (Shift_JIS, GBK, ...); parsing turns the lines
//! into a [`CueSheet`] whose tracks are numbered `1..=N` and whose time ranges
//! chain end-to-start.
//!
//! # Example
//!
//! ```ignore
//! use condense_core::cue::load_cue_sheet;
//!
//! let sheet = load_cue_sheet(Path::new("album/disc.cue"), "disc").await?;
//! for track in &sheet.tracks {
//!     println!("{:02} {} from {}", track.index, track.title, track.start_time);
//! }
//! ```

mod error;
mod loader;
mod parser;
mod types;

use std::path::Path;

pub use error::CueError;
pub use loader::{
    decode_with_candidates, guess_encoding, load_cue_lines, split_lines, FALLBACK_ENCODINGS,
};
pub use parser::{parse_cue, sanitize_title, CueParser, ParserState, ILLEGAL_TITLE_CHARS};
pub use types::{CueSheet, Timestamp, Track, FRAMES_PER_SECOND};

/// Loads and parses the cue sheet at `path`.
///
/// `file_name` is the base name of the audio file the sheet describes.
pub async fn load_cue_sheet(path: &Path, file_name: &str) -> Result<CueSheet, CueError> {
    let lines = load_cue_lines(path).await?;
    parse_cue(file_name, &lines)
}
