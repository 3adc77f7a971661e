//! End-to-end runs through the real converters with shell stand-ins for the
//! external tools.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use condense_core::{
    config::{Config, ExecutableConfig, LossyAudioCodec},
    dispatcher::{Dispatcher, Mode, RunSummary},
    testing::fixtures,
};

/// Writes its last argument, or WAV-ish bytes to stdout when that is `-`.
/// Sources whose path contains `unreadable` fail.
const FAKE_FFMPEG: &str = r#"#!/bin/sh
for arg; do
  case "$arg" in *unreadable*) echo "Invalid data found when processing input" >&2; exit 1;; esac
done
for last; do :; done
if [ "$last" = "-" ]; then
  printf 'RIFFpcm'
else
  printf 'encoded' > "$last"
fi
"#;

const FAKE_FFPROBE: &str = r#"#!/bin/sh
echo '{"format": {"tags": {"ARTIST": "Fixture Band", "ALBUM": "Fixture Album"}}}'
"#;

/// Copies stdin to the path following `-o`.
const FAKE_QAAC: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  shift
done
cat > "$out"
"#;

/// `exhale <preset> <output>`
const FAKE_EXHALE: &str = r#"#!/bin/sh
cat > "$2"
"#;

/// Written once before any test spawns a process.
static TOOLS: Lazy<TempDir> = Lazy::new(|| {
    let dir = TempDir::new().expect("Failed to create tool dir");
    for (name, script) in [
        ("ffmpeg", FAKE_FFMPEG),
        ("ffprobe", FAKE_FFPROBE),
        ("qaac", FAKE_QAAC),
        ("exhale", FAKE_EXHALE),
    ] {
        let path = dir.path().join(name);
        std::fs::write(&path, script).expect("Failed to write tool");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod tool");
    }
    dir
});

fn tool(name: &str) -> PathBuf {
    TOOLS.path().join(name)
}

fn config() -> Config {
    Config {
        worker_num: 2,
        executable: ExecutableConfig {
            ffmpeg: tool("ffmpeg"),
            ffprobe: tool("ffprobe"),
            qaac: tool("qaac"),
            takc: tool("takc"),
            exhale: tool("exhale"),
            mp4als: tool("mp4als"),
        },
        ..Config::default()
    }
}

async fn run(config: Config, mode: Mode, src: &Path, dst: &Path) -> RunSummary {
    Lazy::force(&TOOLS);
    let dispatcher = Dispatcher::new(Arc::new(config), mode);
    tokio::time::timeout(
        Duration::from_secs(30),
        dispatcher.run(src, dst, &CancellationToken::new()),
    )
    .await
    .expect("run did not finish")
    .expect("run failed to start")
}

#[tokio::test]
async fn test_lossless_flac_cue_split() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    fixtures::touch(&src.path().join("album/track.flac"));
    fixtures::write_cue(
        &src.path().join("album/track.cue"),
        "Blue",
        "track.flac",
        &["00:00:00", "03:12:40", "07:01:00"],
    );

    let summary = run(config(), Mode::Lossless, src.path(), dst.path()).await;

    assert!(summary.is_success(), "failures: {:?}", summary.failures);
    assert_eq!(summary.jobs, 1);
    assert_eq!(summary.track_jobs, 3);
    for n in 1..=3 {
        let track = dst.path().join(format!("album/track/{:02}. Track {}.flac", n, n));
        assert_eq!(std::fs::read_to_string(&track).unwrap(), "encoded");
    }

    let cue = std::fs::read_to_string(dst.path().join("album/track.cue")).unwrap();
    assert!(cue.starts_with('\u{feff}'));
    assert!(cue.contains("FILE \"track.flac\" WAVE"));
    assert!(cue.contains("INDEX 01 03:12:40"));
}

#[tokio::test]
async fn test_lossy_cover_png_to_webp() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    fixtures::touch(&src.path().join("album/cover.png"));

    let summary = run(config(), Mode::Lossy, src.path(), dst.path()).await;

    assert!(summary.is_success());
    assert_eq!(summary.jobs, 1);
    assert!(dst.path().join("album/cover.webp").exists());
    assert!(!dst.path().join("album/cover.png").exists());
}

#[tokio::test]
async fn test_aac_pipes_decoder_into_encoder() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    fixtures::touch(&src.path().join("disc.wav"));

    let config = Config {
        audio_codec: LossyAudioCodec::Aac,
        ..config()
    };
    let summary = run(config, Mode::Lossy, src.path(), dst.path()).await;

    assert!(summary.is_success(), "failures: {:?}", summary.failures);
    assert_eq!(
        std::fs::read_to_string(dst.path().join("disc.m4a")).unwrap(),
        "RIFFpcm"
    );
}

#[tokio::test]
async fn test_usac_remux_removes_temp_file() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    fixtures::touch(&src.path().join("a/disc.flac"));

    let config = Config {
        audio_codec: LossyAudioCodec::Usac,
        ..config()
    };
    let summary = run(config, Mode::Lossy, src.path(), dst.path()).await;

    assert!(summary.is_success(), "failures: {:?}", summary.failures);
    assert!(dst.path().join("a/disc.m4a").exists());
    assert!(!dst.path().join("a/_tmp_disc.m4a").exists());
}

#[tokio::test]
async fn test_tool_failure_is_reported() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    fixtures::touch(&src.path().join("unreadable.flac"));
    fixtures::touch(&src.path().join("fine.flac"));

    let summary = run(config(), Mode::Lossy, src.path(), dst.path()).await;

    assert_eq!(summary.jobs, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failures.len(), 1);
    assert!(summary.failures[0].error.contains("exit code 1"));
    assert!(dst.path().join("fine.opus").exists());
}

#[tokio::test]
async fn test_missing_encoder_fails_job() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    fixtures::touch(&src.path().join("disc.wav"));

    let mut config = config();
    config.executable.qaac = PathBuf::from("/nonexistent/qaac");
    config.audio_codec = LossyAudioCodec::Aac;
    let summary = run(config, Mode::Lossy, src.path(), dst.path()).await;

    assert_eq!(summary.failures.len(), 1);
    assert!(summary.failures[0].error.contains("Failed to start qaac"));
}
