//! Maps source paths into the mirrored destination tree.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from destination path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// The file does not live under the source root.
    #[error("{path} is not inside source root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// The file has no usable base name.
    #[error("{path} has no file name")]
    NoFileName { path: PathBuf },

    /// A destination directory could not be created.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Relative path of `file` below `src_root`.
pub fn relative_to(file: &Path, src_root: &Path) -> Result<PathBuf, PathError> {
    file.strip_prefix(src_root)
        .map(Path::to_path_buf)
        .map_err(|_| PathError::OutsideRoot {
            path: file.to_path_buf(),
            root: src_root.to_path_buf(),
        })
}

/// Base name of `file` without its extension.
pub fn file_stem(file: &Path) -> Result<String, PathError> {
    file.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| PathError::NoFileName {
            path: file.to_path_buf(),
        })
}

/// Extension of `file` with its leading dot as written (e.g. `.FLAC`), or
/// an empty string.
pub fn dotted_extension(file: &Path) -> String {
    file.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// Lower-cased extension without the dot, used for handler lookup.
pub fn normalized_extension(file: &Path) -> Option<String> {
    file.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// Destination path for `file` with its extension replaced by `extension`
/// (given with its dot, e.g. `.opus`; empty keeps the name unchanged).
///
/// The parent directory is created when missing.
pub async fn mirror_file_path(
    file: &Path,
    src_root: &Path,
    dst_root: &Path,
    extension: &str,
) -> Result<PathBuf, PathError> {
    let relative = relative_to(file, src_root)?;
    let mut target = dst_root.join(&relative);
    if !extension.is_empty() {
        target.set_extension(extension.trim_start_matches('.'));
    }
    if let Some(parent) = target.parent() {
        ensure_dir(parent).await?;
    }
    Ok(target)
}

/// Per-album directory for cue-split output:
/// `<dst_root>/<relative dir of file>/<file stem>/`, created when missing.
pub async fn album_dir(file: &Path, src_root: &Path, dst_root: &Path) -> Result<PathBuf, PathError> {
    let relative = relative_to(file, src_root)?;
    let stem = file_stem(file)?;
    let dir = match relative.parent() {
        Some(parent) => dst_root.join(parent).join(stem),
        None => dst_root.join(stem),
    };
    ensure_dir(&dir).await?;
    Ok(dir)
}

/// Companion cue sheet path for an audio file (`a/b.flac` -> `a/b.cue`).
pub fn companion_cue(file: &Path) -> PathBuf {
    file.with_extension("cue")
}

async fn ensure_dir(dir: &Path) -> Result<(), PathError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| PathError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_mirror_file_path_replaces_extension() {
        let dst = TempDir::new().unwrap();
        let target = mirror_file_path(
            Path::new("/music/Artist/Album/01.flac"),
            Path::new("/music"),
            dst.path(),
            ".opus",
        )
        .await
        .unwrap();

        assert_eq!(target, dst.path().join("Artist/Album/01.opus"));
        assert!(dst.path().join("Artist/Album").is_dir());
    }

    #[tokio::test]
    async fn test_mirror_file_path_keeps_name_without_extension() {
        let dst = TempDir::new().unwrap();
        let target = mirror_file_path(
            Path::new("/music/scans/booklet.jpg"),
            Path::new("/music"),
            dst.path(),
            "",
        )
        .await
        .unwrap();
        assert_eq!(target, dst.path().join("scans/booklet.jpg"));
    }

    #[tokio::test]
    async fn test_album_dir_nests_under_stem() {
        let dst = TempDir::new().unwrap();
        let dir = album_dir(
            Path::new("/music/album/track.flac"),
            Path::new("/music"),
            dst.path(),
        )
        .await
        .unwrap();
        assert_eq!(dir, dst.path().join("album/track"));
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_album_dir_at_root() {
        let dst = TempDir::new().unwrap();
        let dir = album_dir(Path::new("/music/disc.wav"), Path::new("/music"), dst.path())
            .await
            .unwrap();
        assert_eq!(dir, dst.path().join("disc"));
    }

    #[tokio::test]
    async fn test_outside_root_fails() {
        let dst = TempDir::new().unwrap();
        let result =
            mirror_file_path(Path::new("/other/a.flac"), Path::new("/music"), dst.path(), ".opus")
                .await;
        assert!(matches!(result, Err(PathError::OutsideRoot { .. })));
    }

    #[test]
    fn test_extension_helpers() {
        assert_eq!(normalized_extension(Path::new("a/B.FLAC")), Some("flac".to_string()));
        assert_eq!(normalized_extension(Path::new("a/README")), None);
        assert_eq!(dotted_extension(Path::new("a/B.Flac")), ".Flac");
        assert_eq!(companion_cue(Path::new("a/b.flac")), PathBuf::from("a/b.cue"));
    }
}
