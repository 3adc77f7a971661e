//! Audio converter built on ffmpeg and the external encoders.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{Config, ExecutableConfig};
use crate::metadata::Metadata;
use crate::process::{ProcessPipeline, Stage};

use super::codec::{AudioCodec, EncodeStrategy};
use super::error::ConverterError;
use super::probe::probe_tags;
use super::traits::Converter;
use super::types::{temp_sibling, ConversionJob, TrackJob};

/// Converts audio files to one configured codec.
#[derive(Debug, Clone)]
pub struct AudioConverter {
    codec: AudioCodec,
    tools: ExecutableConfig,
    log_level: String,
}

impl AudioConverter {
    pub fn new(codec: AudioCodec, tools: ExecutableConfig, log_level: impl Into<String>) -> Self {
        Self {
            codec,
            tools,
            log_level: log_level.into(),
        }
    }

    /// Converter for lossy runs.
    pub fn lossy(config: &Config) -> Self {
        Self::new(
            AudioCodec::lossy(config),
            config.executable.clone(),
            config.ffmpeg_log_level.clone(),
        )
    }

    /// Converter for lossless runs.
    pub fn lossless(config: &Config) -> Self {
        Self::new(
            AudioCodec::lossless(config),
            config.executable.clone(),
            config.ffmpeg_log_level.clone(),
        )
    }

    /// Builds the process pipeline for one encode.
    ///
    /// `range` holds `-ss/-to` arguments (empty for whole files) and `tags`
    /// the metadata to write into the output.
    pub fn build_pipeline(
        &self,
        source: &Path,
        range: &[String],
        tags: &Metadata,
        output: &Path,
    ) -> ProcessPipeline {
        match self.codec.strategy() {
            EncodeStrategy::Ffmpeg => ProcessPipeline::new().stage(
                self.decode_stage(source, range)
                    .args(tags.to_ffmpeg_args())
                    .args(self.codec.ffmpeg_args())
                    .path_arg(output),
            ),
            EncodeStrategy::Qaac => {
                let qaac = Stage::new(&self.tools.qaac)
                    .args(self.codec.qaac_args())
                    .args(["--ignorelength", "--silent"])
                    .args(tags.format_args("--long-tag", |k, v| format!("{}:{}", k, v)))
                    .arg("-o")
                    .path_arg(output)
                    .arg("-")
                    .stdin_from_previous();
                ProcessPipeline::new()
                    .stage(self.wav_pipe_stage(source, range))
                    .stage(qaac)
            }
            EncodeStrategy::Takc => {
                let preset = match &self.codec {
                    AudioCodec::Tak { preset } => preset.as_str(),
                    _ => "p4m",
                };
                let takc = Stage::new(&self.tools.takc)
                    .args(["-e", "-ihs", "-silent", "-md5", "-overwrite"])
                    .arg(format!("-{}", preset))
                    .args(tags.format_args("-tt", |k, v| format!("{}={}", k, v)))
                    .arg("-")
                    .path_arg(output)
                    .stdin_from_previous();
                ProcessPipeline::new()
                    .stage(self.wav_pipe_stage(source, range))
                    .stage(takc)
            }
            EncodeStrategy::Exhale => {
                let preset = match &self.codec {
                    AudioCodec::Usac { preset } => preset.as_str(),
                    _ => "5",
                };
                let tmp = temp_sibling(output, "");
                let exhale = Stage::new(&self.tools.exhale)
                    .arg(preset)
                    .path_arg(&tmp)
                    .stdin_from_previous();
                ProcessPipeline::new()
                    .stage(self.wav_pipe_stage(source, range))
                    .stage(exhale)
                    .stage(self.remux_stage(&tmp, tags, output, None))
                    .temp_file(tmp)
            }
            EncodeStrategy::Mp4als => {
                let tmp_mp4 = temp_sibling(&output.with_extension("mp4"), "");
                let tmp_wav = temp_sibling(&output.with_extension("mp4"), ".wav");
                let mp4als = Stage::new(&self.tools.mp4als)
                    .args(["-7", "-r-1", "-MP4"])
                    .path_arg(&tmp_wav)
                    .path_arg(&tmp_mp4);
                ProcessPipeline::new()
                    .stage(self.decode_stage(source, range).path_arg(&tmp_wav))
                    .stage(mp4als)
                    .stage(self.remux_stage(&tmp_mp4, tags, output, Some("mp4")))
                    .temp_file(tmp_wav)
                    .temp_file(tmp_mp4)
            }
        }
    }

    /// `ffmpeg -y -loglevel L -i <source> [range]`
    fn decode_stage(&self, source: &Path, range: &[String]) -> Stage {
        Stage::new(&self.tools.ffmpeg)
            .args(["-y", "-loglevel", self.log_level.as_str(), "-i"])
            .path_arg(source)
            .args(range.iter().cloned())
    }

    /// Decode to WAV on stdout for a piped encoder.
    fn wav_pipe_stage(&self, source: &Path, range: &[String]) -> Stage {
        self.decode_stage(source, range)
            .args(["-f", "wav", "-"])
            .stdout_to_next()
    }

    /// Stream copy `input` to `output` with `tags` applied.
    fn remux_stage(
        &self,
        input: &Path,
        tags: &Metadata,
        output: &Path,
        format: Option<&str>,
    ) -> Stage {
        let mut stage = Stage::new(&self.tools.ffmpeg)
            .args(["-y", "-loglevel", self.log_level.as_str(), "-i"])
            .path_arg(input)
            .args(["-c", "copy"])
            .args(tags.to_ffmpeg_args());
        if let Some(format) = format {
            stage = stage.args(["-f", format]);
        }
        stage.path_arg(output)
    }
}

#[async_trait]
impl Converter for AudioConverter {
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
        let tags = if self.codec.needs_probed_tags() {
            probe_tags(&self.tools.ffprobe, &self.log_level, &job.source, cancel).await?
        } else {
            Metadata::new()
        };

        self.build_pipeline(&job.source, &[], &tags, &output)
            .run(cancel)
            .await?;
        Ok(output)
    }

    async fn convert_track(
        &self,
        job: &TrackJob,
        cancel: &CancellationToken,
    ) -> Result<(), ConverterError> {
        info!(
            "converting to {}: {}, track {:02}",
            self.codec.format_name(),
            job.source.display(),
            job.index
        );

        self.build_pipeline(&job.source, &job.range_args(), &job.metadata, &job.output)
            .run(cancel)
            .await?;
        Ok(())
    }
}
