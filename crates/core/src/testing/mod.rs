//! Testing utilities and mock implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use condense_core::testing::{fixtures, MockConverter};
//!
//! let converter = Arc::new(MockConverter::new(".opus"));
//! fixtures::write_cue(&src.join("disc.cue"), "Album", "disc.flac", &["00:00:00", "03:10:00"]);
//! ```

mod mock_converter;

pub use mock_converter::{MockConverter, RecordedConversion};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    /// Write an empty file, creating parent directories.
    pub fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture dir");
        }
        std::fs::write(path, b"").expect("write fixture file");
    }

    /// Cue sheet text for `audio_file` with one track per start position.
    pub fn cue_text(album: &str, audio_file: &str, starts: &[&str]) -> String {
        let mut text = format!(
            "PERFORMER \"Fixture Band\"\nTITLE \"{}\"\nFILE \"{}\" WAVE\n",
            album, audio_file
        );
        for (i, start) in starts.iter().enumerate() {
            text.push_str(&format!(
                "  TRACK {:02} AUDIO\n    TITLE \"Track {}\"\n    INDEX 01 {}\n",
                i + 1,
                i + 1,
                start
            ));
        }
        text
    }

    /// Write a UTF-8 cue sheet next to an audio fixture.
    pub fn write_cue(path: &Path, album: &str, audio_file: &str, starts: &[&str]) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture dir");
        }
        std::fs::write(path, cue_text(album, audio_file, starts)).expect("write cue fixture");
    }
}
