//! Plain file copy and cue sheet rewriting.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::converter::{ConversionJob, ConverterError};
use crate::cue::load_cue_lines;

const UTF8_BOM: &str = "\u{feff}";

/// Copies `job.source` unchanged to its mirrored path.
pub async fn copy_file(job: &ConversionJob) -> Result<PathBuf, ConverterError> {
    info!("copying: {}", job.source.display());
    let target = job.output_path("").await?;
    tokio::fs::copy(&job.source, &target).await?;
    Ok(target)
}

/// Re-emits the cue sheet at `source_cue` as UTF-8 with BOM at `target`,
/// with every occurrence of `old_ext` replaced by `new_ext`.
pub async fn rewrite_cue(
    source_cue: &Path,
    target: &Path,
    old_ext: &str,
    new_ext: &str,
) -> Result<(), ConverterError> {
    let lines = load_cue_lines(source_cue).await?;

    let mut text = String::from(UTF8_BOM);
    for line in &lines {
        if old_ext.is_empty() {
            text.push_str(line);
        } else {
            text.push_str(&line.replace(old_ext, new_ext));
        }
    }

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(target, text).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_copy_file_mirrors_path() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let source = src.path().join("album/scans/back.jpg");
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, b"jpeg bytes").unwrap();

        let job = ConversionJob::new(&source, src.path(), dst.path());
        let target = copy_file(&job).await.unwrap();

        assert_eq!(target, dst.path().join("album/scans/back.jpg"));
        assert_eq!(std::fs::read(&target).unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_rewrite_cue_replaces_extension_and_adds_bom() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("disc.cue");
        std::fs::write(
            &source,
            "TITLE \"Disc\"\r\nFILE \"disc.wav\" WAVE\r\n  TRACK 01 AUDIO\r\n",
        )
        .unwrap();

        let target = dir.path().join("out/disc.cue");
        rewrite_cue(&source, &target, ".wav", ".flac").await.unwrap();

        let bytes = std::fs::read(&target).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert_eq!(
            text,
            "TITLE \"Disc\"\r\nFILE \"disc.flac\" WAVE\r\n  TRACK 01 AUDIO\r\n"
        );
    }

    #[tokio::test]
    async fn test_rewrite_cue_replaces_only_exact_extension() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("disc.cue");
        std::fs::write(&source, "FILE \"disc.FLAC\" WAVE\nREM COMMENT \"from .flac rip\"\n").unwrap();

        let target = dir.path().join("disc2.cue");
        rewrite_cue(&source, &target, ".FLAC", ".tak").await.unwrap();

        let text = std::fs::read_to_string(&target).unwrap();
        assert_eq!(
            text.trim_start_matches('\u{feff}'),
            "FILE \"disc.tak\" WAVE\nREM COMMENT \"from .flac rip\"\n"
        );
    }
}
