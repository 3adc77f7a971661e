//! Types for the converter module.

use std::path::{Path, PathBuf};

use crate::cue::{Timestamp, Track};
use crate::metadata::Metadata;
use crate::paths::{self, PathError};

use super::error::ConverterError;

/// One matched source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// File to process.
    pub source: PathBuf,
    /// Root of the tree being mirrored.
    pub source_root: PathBuf,
    /// Root of the destination tree.
    pub dest_root: PathBuf,
}

impl ConversionJob {
    pub fn new(
        source: impl Into<PathBuf>,
        source_root: impl Into<PathBuf>,
        dest_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            source_root: source_root.into(),
            dest_root: dest_root.into(),
        }
    }

    /// Base name of the source without extension.
    pub fn stem(&self) -> Result<String, PathError> {
        paths::file_stem(&self.source)
    }

    /// Mirrored output path with the extension replaced; parents are created.
    pub async fn output_path(&self, extension: &str) -> Result<PathBuf, PathError> {
        paths::mirror_file_path(&self.source, &self.source_root, &self.dest_root, extension).await
    }

    /// Per-album output directory used for cue splits; created when missing.
    pub async fn album_dir(&self) -> Result<PathBuf, PathError> {
        paths::album_dir(&self.source, &self.source_root, &self.dest_root).await
    }

    /// Companion cue sheet path (`<dir>/<stem>.cue`).
    pub fn companion_cue(&self) -> PathBuf {
        paths::companion_cue(&self.source)
    }
}

/// One cue track to extract from a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackJob {
    pub source: PathBuf,
    pub index: u32,
    /// Final output path: `<album dir>/<NN>. <title><ext>`.
    pub output: PathBuf,
    pub start: Timestamp,
    /// Missing on the final track, which runs to end of input.
    pub end: Option<Timestamp>,
    pub metadata: Metadata,
}

impl TrackJob {
    /// Derives the job for `track` with output under `album_dir`.
    pub fn from_track(source: &Path, album_dir: &Path, track: &Track, extension: &str) -> Self {
        Self {
            source: source.to_path_buf(),
            index: track.index,
            output: album_dir.join(track.file_name(extension)),
            start: track.start_time,
            end: track.end_time,
            metadata: track.metadata.clone(),
        }
    }

    /// `-ss <start> [-to <end>]` arguments for ffmpeg.
    pub fn range_args(&self) -> Vec<String> {
        let mut args = vec!["-ss".to_string(), self.start.to_string()];
        if let Some(end) = self.end {
            args.push("-to".to_string());
            args.push(end.to_string());
        }
        args
    }
}

/// Result of one per-track sub-job.
#[derive(Debug)]
pub struct TrackOutcome {
    pub index: u32,
    pub output: PathBuf,
    pub result: Result<(), ConverterError>,
}

/// Temp-file path next to `output`: `<dir>/_tmp_<name><suffix>`.
pub fn temp_sibling(output: &Path, suffix: &str) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!("_tmp_{}{}", name, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(index: u32, end: Option<&str>) -> Track {
        let mut metadata = Metadata::new();
        metadata.insert("title", "Intro");
        Track {
            index,
            title: "Intro".to_string(),
            start_time: Timestamp::parse_msf("00:02:37").unwrap(),
            end_time: end.and_then(Timestamp::parse_msf),
            metadata,
        }
    }

    #[test]
    fn test_track_job_from_track() {
        let job = TrackJob::from_track(
            Path::new("/src/album.flac"),
            Path::new("/dst/album"),
            &track(3, Some("04:00:00")),
            ".opus",
        );

        assert_eq!(job.index, 3);
        assert_eq!(job.output, PathBuf::from("/dst/album/03. Intro.opus"));
        assert_eq!(job.metadata.get("title"), Some("Intro"));
        assert_eq!(job.range_args(), vec!["-ss", "0:00:02.493", "-to", "0:04:00.000"]);
    }

    #[test]
    fn test_last_track_has_no_end() {
        let job = TrackJob::from_track(
            Path::new("/src/album.flac"),
            Path::new("/dst/album"),
            &track(12, None),
            ".flac",
        );
        assert_eq!(job.range_args(), vec!["-ss", "0:00:02.493"]);
    }

    #[test]
    fn test_temp_sibling() {
        assert_eq!(
            temp_sibling(Path::new("/dst/a/01. x.m4a"), ""),
            PathBuf::from("/dst/a/_tmp_01. x.m4a")
        );
        assert_eq!(
            temp_sibling(Path::new("/dst/a/disc.mp4"), ".wav"),
            PathBuf::from("/dst/a/_tmp_disc.mp4.wav")
        );
    }
}
