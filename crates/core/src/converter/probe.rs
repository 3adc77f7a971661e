//! Source tag extraction through ffprobe.

use serde::Deserialize;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::metadata::Metadata;
use crate::process::{ProcessPipeline, Stage};

use super::error::ConverterError;

/// Reads the container-level tags of `source`.
pub async fn probe_tags(
    ffprobe: &Path,
    log_level: &str,
    source: &Path,
    cancel: &CancellationToken,
) -> Result<Metadata, ConverterError> {
    let stage = Stage::new(ffprobe)
        .args(["-loglevel", log_level, "-show_format", "-of", "json"])
        .path_arg(source)
        .capture_stdout();

    let stdout = ProcessPipeline::new().stage(stage).run(cancel).await?;
    if stdout.is_empty() {
        return Err(ConverterError::probe_failed(format!(
            "ffprobe returned no output for {}",
            source.display()
        )));
    }

    parse_probe_tags(&stdout)
}

/// Extracts `format.tags` from `ffprobe -show_format -of json` output.
///
/// A missing `format` or `tags` object yields empty metadata. Non-string
/// values are rendered as JSON text.
pub fn parse_probe_tags(output: &[u8]) -> Result<Metadata, ConverterError> {
    #[derive(Deserialize)]
    struct ProbeOutput {
        #[serde(default)]
        format: Option<ProbeFormat>,
    }

    #[derive(Deserialize)]
    struct ProbeFormat {
        #[serde(default)]
        tags: Option<serde_json::Map<String, serde_json::Value>>,
    }

    let probe: ProbeOutput =
        serde_json::from_slice(output).map_err(|e| ConverterError::ParseError {
            reason: format!("Failed to parse ffprobe output: {}", e),
        })?;

    let tags = probe.format.and_then(|f| f.tags).unwrap_or_default();

    Ok(tags
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_tags() {
        let output = br#"{
            "format": {
                "filename": "disc.flac",
                "format_name": "flac",
                "tags": {
                    "ALBUM": "Blue",
                    "ARTIST": "Someone",
                    "track": 3
                }
            }
        }"#;

        let tags = parse_probe_tags(output).unwrap();
        assert_eq!(tags.len(), 3);
        assert_eq!(tags.get("ALBUM"), Some("Blue"));
        assert_eq!(tags.get("ARTIST"), Some("Someone"));
        assert_eq!(tags.get("track"), Some("3"));
    }

    #[test]
    fn test_parse_probe_without_tags() {
        let tags = parse_probe_tags(br#"{"format": {"format_name": "wav"}}"#).unwrap();
        assert!(tags.is_empty());

        let tags = parse_probe_tags(b"{}").unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn test_parse_probe_invalid_json() {
        let result = parse_probe_tags(b"not json");
        assert!(matches!(result, Err(ConverterError::ParseError { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_tags_runs_tool() {
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let tool = dir.path().join("ffprobe");
        std::fs::write(
            &tool,
            "#!/bin/sh\necho '{\"format\": {\"tags\": {\"TITLE\": \"Side A\"}}}'\n",
        )
        .unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let tags = probe_tags(&tool, "error", Path::new("in.flac"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(tags.get("TITLE"), Some("Side A"));
    }
}
