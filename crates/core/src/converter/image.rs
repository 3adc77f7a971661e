//! Image converter for scans and artwork.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::process::{ProcessPipeline, Stage};

use super::codec::ImageCodec;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{ConversionJob, TrackJob};

/// Re-encodes images with ffmpeg.
#[derive(Debug, Clone)]
pub struct ImageConverter {
    codec: ImageCodec,
    ffmpeg: PathBuf,
    log_level: String,
}

impl ImageConverter {
    pub fn new(codec: ImageCodec, ffmpeg: impl Into<PathBuf>, log_level: impl Into<String>) -> Self {
        Self {
            codec,
            ffmpeg: ffmpeg.into(),
            log_level: log_level.into(),
        }
    }

    pub fn lossy(config: &Config) -> Self {
        Self::new(
            ImageCodec::lossy(config),
            &config.executable.ffmpeg,
            config.ffmpeg_log_level.clone(),
        )
    }

    pub fn lossless(config: &Config) -> Self {
        Self::new(
            ImageCodec::lossless(config),
            &config.executable.ffmpeg,
            config.ffmpeg_log_level.clone(),
        )
    }

    /// `ffmpeg -y -loglevel L -i <source> <format options> <output>`
    pub fn build_pipeline(&self, source: &Path, output: &Path) -> ProcessPipeline {
        ProcessPipeline::new().stage(
            Stage::new(&self.ffmpeg)
                .args(["-y", "-loglevel", self.log_level.as_str(), "-i"])
                .path_arg(source)
                .args(self.codec.ffmpeg_args())
                .path_arg(output),
        )
    }
}

#[async_trait]
impl Converter for ImageConverter {
    fn name(&self) -> &str {
        self.codec.format_name()
    }

    fn output_extension(&self) -> &str {
        self.codec.extension()
    }

    async fn convert_whole(
        &self,
        job: &ConversionJob,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, ConverterError> {
        info!(
            "converting to {}: {}",
            self.codec.format_name(),
            job.source.display()
        );

        let output = job.output_path(self.codec.extension()).await?;
        self.build_pipeline(&job.source, &output).run(cancel).await?;
        Ok(output)
    }

    async fn convert_track(
        &self,
        job: &TrackJob,
        _cancel: &CancellationToken,
    ) -> Result<(), ConverterError> {
        Err(ConverterError::unsupported(format!(
            "images have no tracks ({})",
            job.source.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lossy_webp_pipeline() {
        let converter = ImageConverter::lossy(&Config::default());
        let pipeline =
            converter.build_pipeline(Path::new("/src/scans/01.png"), Path::new("/dst/scans/01.webp"));

        assert_eq!(pipeline.stages().len(), 1);
        assert_eq!(
            pipeline.stages()[0].arguments(),
            [
                "-y",
                "-loglevel",
                "error",
                "-i",
                "/src/scans/01.png",
                "-quality",
                "78",
                "/dst/scans/01.webp",
            ]
        );
    }

    #[test]
    fn test_lossless_webp_args() {
        let converter = ImageConverter::new(ImageCodec::WebpLossless, "ffmpeg", "warning");
        let pipeline = converter.build_pipeline(Path::new("/a.bmp"), Path::new("/b.webp"));
        assert_eq!(
            pipeline.stages()[0].arguments(),
            ["-y", "-loglevel", "warning", "-i", "/a.bmp", "-lossless", "1", "/b.webp"]
        );
    }

    #[test]
    fn test_extension_and_name() {
        let converter = ImageConverter::lossless(&Config::default());
        assert_eq!(converter.output_extension(), ".png");
        assert_eq!(converter.name(), "PNG");
    }

    #[tokio::test]
    async fn test_track_conversion_unsupported() {
        let converter = ImageConverter::lossy(&Config::default());
        let job = TrackJob {
            source: PathBuf::from("/a.png"),
            index: 1,
            output: PathBuf::from("/b.webp"),
            start: crate::cue::Timestamp::parse_msf("00:00:00").unwrap(),
            end: None,
            metadata: Default::default(),
        };
        let result = converter.convert_track(&job, &CancellationToken::new()).await;
        assert!(matches!(result, Err(ConverterError::Unsupported { .. })));
    }
}
