//! Types produced by the cue parser.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::metadata::Metadata;

/// Cue sheet frames per second.
pub const FRAMES_PER_SECOND: u32 = 75;

/// A position inside the source audio, as written by `INDEX 01 mm:ss:ff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
}

impl Timestamp {
    /// Parses a cue `mm:ss:ff` position. Seconds must be below 60 and
    /// frames below [`FRAMES_PER_SECOND`].
    pub fn parse_msf(value: &str) -> Option<Self> {
        let mut parts = value.trim().split(':');
        let minutes = parts.next()?.trim().parse().ok()?;
        let seconds: u32 = parts.next()?.trim().parse().ok()?;
        let frames: u32 = parts.next()?.trim().parse().ok()?;
        if parts.next().is_some() || seconds >= 60 || frames >= FRAMES_PER_SECOND {
            return None;
        }
        Some(Self {
            minutes,
            seconds,
            frames,
        })
    }

    /// Milliseconds contributed by the frame count, rounded to nearest.
    pub fn frame_millis(&self) -> u64 {
        let fps = u64::from(FRAMES_PER_SECOND);
        (u64::from(self.frames) * 1000 + fps / 2) / fps
    }

    /// Total offset in milliseconds.
    pub fn as_millis(&self) -> u64 {
        (u64::from(self.minutes) * 60 + u64::from(self.seconds)) * 1000
            + self.frame_millis()
    }
}

/// Renders as `H:MM:SS.mmm`, the form ffmpeg accepts for `-ss` / `-to`.
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{:02}:{:02}.{:03}",
            self.minutes / 60,
            self.minutes % 60,
            self.seconds,
            self.frame_millis()
        )
    }
}

/// One logical track inside a cue-described audio file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// 1-based track number.
    pub index: u32,
    /// Filesystem-safe display title.
    pub title: String,
    pub start_time: Timestamp,
    /// `None` for the last track, meaning "until the end of the source".
    pub end_time: Option<Timestamp>,
    /// Tags for this track (global tags overridden by track directives).
    pub metadata: Metadata,
}

impl Track {
    /// Output file name, e.g. `03. Title.flac`.
    pub fn file_name(&self, extension: &str) -> String {
        format!("{:02}. {}{}", self.index, self.title, extension)
    }
}

/// A parsed cue sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueSheet {
    /// Album-level tags.
    pub metadata: Metadata,
    pub tracks: Vec<Track>,
}

impl CueSheet {
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
