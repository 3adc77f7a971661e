//! Extension to handler lookup.

use std::path::Path;

use crate::paths::normalized_extension;

use super::types::{HandlerCategory, Mode};

/// Source audio extensions, shared by both modes.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac", "aiff", "ape", "tak", "tta", "wv", "alac"];

/// Source image extensions, shared by both modes.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "tiff", "tif", "bmp"];

/// Already-lossy media copied unchanged in lossy mode.
pub const LOSSY_COPY_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jp2", "webp", "heif", "heic", "mp3", "m4a", "aac", "ogg", "opus", "mkv", "avi",
    "mp4",
];

/// Cue sheets are consumed by audio jobs in lossless mode.
pub const CUE_EXTENSION: &str = "cue";

/// Per-mode handler table.
#[derive(Debug, Clone, Copy)]
pub struct HandlerTable {
    mode: Mode,
    copy_unmapped: bool,
}

impl HandlerTable {
    pub fn new(mode: Mode, copy_unmapped: bool) -> Self {
        Self {
            mode,
            copy_unmapped,
        }
    }

    /// Handler for a lower-cased extension, or `None` to skip.
    pub fn lookup(&self, extension: &str) -> Option<HandlerCategory> {
        if AUDIO_EXTENSIONS.contains(&extension) {
            return Some(HandlerCategory::Audio);
        }
        if IMAGE_EXTENSIONS.contains(&extension) {
            return Some(HandlerCategory::Image);
        }
        if self.mode == Mode::Lossless && extension == CUE_EXTENSION {
            return None;
        }
        if self.mode == Mode::Lossy && LOSSY_COPY_EXTENSIONS.contains(&extension) {
            return Some(HandlerCategory::Copy);
        }
        self.copy_unmapped.then_some(HandlerCategory::Copy)
    }

    /// Handler for a file path; matching ignores extension case.
    pub fn classify(&self, path: &Path) -> Option<HandlerCategory> {
        match normalized_extension(path) {
            Some(ext) => self.lookup(&ext),
            None => self.copy_unmapped.then_some(HandlerCategory::Copy),
        }
    }
}
