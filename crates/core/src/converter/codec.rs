//! Target codecs with their resolved parameters.

use crate::config::{
    Config, LosslessAudioCodec, LosslessImageFormat, LossyAudioCodec, LossyImageFormat,
};

/// How an audio codec is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeStrategy {
    /// ffmpeg encodes directly to the output.
    Ffmpeg,
    /// ffmpeg decodes to WAV on stdout, piped into qaac.
    Qaac,
    /// ffmpeg decodes to WAV on stdout, piped into takc.
    Takc,
    /// ffmpeg pipes WAV into exhale, then ffmpeg remuxes with tags.
    Exhale,
    /// ffmpeg writes a WAV temp file, mp4als encodes it, then ffmpeg remuxes.
    Mp4als,
}

/// Audio target codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCodec {
    Opus { bitrate: u32 },
    Mp3 { bitrate: u32, joint: bool },
    Vorbis { bitrate: u32 },
    Aac { bitrate: u32, he: bool },
    Usac { preset: String },
    Flac { compression_level: u32 },
    Alac,
    Tak { preset: String },
    Wavpack { compression_level: u32 },
    Tta,
    Als,
}

impl AudioCodec {
    /// Codec for lossy runs.
    pub fn lossy(config: &Config) -> Self {
        match config.audio_codec {
            LossyAudioCodec::Opus => Self::Opus {
                bitrate: config.opus_config.bitrate,
            },
            LossyAudioCodec::Mp3 => Self::Mp3 {
                bitrate: config.mp3_config.bitrate,
                joint: config.mp3_config.joint,
            },
            LossyAudioCodec::Vorbis => Self::Vorbis {
                bitrate: config.vorbis_config.bitrate,
            },
            LossyAudioCodec::Aac => Self::Aac {
                bitrate: config.aac_config.bitrate,
                he: config.aac_config.he,
            },
            LossyAudioCodec::Usac => Self::Usac {
                preset: config.usac_config.preset.clone(),
            },
        }
    }

    /// Codec for lossless runs.
    pub fn lossless(config: &Config) -> Self {
        match config.lossless_audio_codec {
            LosslessAudioCodec::Flac => Self::Flac {
                compression_level: config.flac_config.compression_level,
            },
            LosslessAudioCodec::Alac => Self::Alac,
            LosslessAudioCodec::Tak => Self::Tak {
                preset: config.tak_config.preset.clone(),
            },
            LosslessAudioCodec::Wavpack => Self::Wavpack {
                compression_level: config.wavpack_config.compression_level,
            },
            LosslessAudioCodec::Tta => Self::Tta,
            LosslessAudioCodec::Als => Self::Als,
        }
    }

    /// Output extension including the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Opus { .. } => ".opus",
            Self::Mp3 { .. } => ".mp3",
            Self::Vorbis { .. } => ".ogg",
            Self::Aac { .. } | Self::Usac { .. } | Self::Alac | Self::Als => ".m4a",
            Self::Flac { .. } => ".flac",
            Self::Tak { .. } => ".tak",
            Self::Wavpack { .. } => ".wv",
            Self::Tta => ".tta",
        }
    }

    /// Human-readable format name used in progress logs.
    pub fn format_name(&self) -> &'static str {
        match self {
            Self::Opus { .. } => "OPUS",
            Self::Mp3 { .. } => "MP3",
            Self::Vorbis { .. } => "Vorbis",
            Self::Aac { .. } => "AAC",
            Self::Usac { .. } => "USAC",
            Self::Flac { .. } => "FLAC",
            Self::Alac => "ALAC",
            Self::Tak { .. } => "TAK",
            Self::Wavpack { .. } => "WavPack",
            Self::Tta => "TrueAudio",
            Self::Als => "ALS",
        }
    }

    pub fn strategy(&self) -> EncodeStrategy {
        match self {
            Self::Opus { .. }
            | Self::Mp3 { .. }
            | Self::Vorbis { .. }
            | Self::Flac { .. }
            | Self::Wavpack { .. }
            | Self::Tta => EncodeStrategy::Ffmpeg,
            Self::Aac { .. } | Self::Alac => EncodeStrategy::Qaac,
            Self::Tak { .. } => EncodeStrategy::Takc,
            Self::Usac { .. } => EncodeStrategy::Exhale,
            Self::Als => EncodeStrategy::Mp4als,
        }
    }

    /// Whether whole-file conversion must copy source tags explicitly.
    ///
    /// ffmpeg carries tags over on its own; every other encoder receives
    /// decoded PCM and needs the probed tags passed along.
    pub fn needs_probed_tags(&self) -> bool {
        self.strategy() != EncodeStrategy::Ffmpeg
    }

    /// ffmpeg output options for direct encoders.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        match self {
            Self::Opus { bitrate } => args(&["-c:a", "libopus", "-b:a", &format!("{}k", bitrate)]),
            Self::Mp3 { bitrate, joint } => args(&[
                "-c:a",
                "libmp3lame",
                "-b:a",
                &format!("{}k", bitrate),
                "-joint_stereo",
                if *joint { "1" } else { "0" },
            ]),
            Self::Vorbis { bitrate } => {
                args(&["-c:a", "libvorbis", "-b:a", &format!("{}k", bitrate)])
            }
            Self::Flac { compression_level } => args(&[
                "-c:a",
                "flac",
                "-compression_level",
                &compression_level.to_string(),
            ]),
            Self::Wavpack { compression_level } => args(&[
                "-c:a",
                "wavpack",
                "-compression_level",
                &compression_level.to_string(),
            ]),
            Self::Tta => args(&["-c:a", "tta"]),
            _ => Vec::new(),
        }
    }

    /// qaac encoder options placed before the common flags.
    pub fn qaac_args(&self) -> Vec<String> {
        match self {
            Self::Aac { bitrate, he } => {
                let mut out = args(&["-v", &bitrate.to_string()]);
                if *he {
                    out.push("--he".to_string());
                }
                out
            }
            Self::Alac => args(&["--alac"]),
            _ => Vec::new(),
        }
    }
}

/// Image target format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCodec {
    Webp { quality: u32 },
    Jpeg { qscale: u32 },
    WebpLossless,
    Png { compression_level: u32 },
}

impl ImageCodec {
    /// Format for lossy runs.
    pub fn lossy(config: &Config) -> Self {
        match config.scan_format {
            LossyImageFormat::Webp => Self::Webp {
                quality: config.webp_config.quality,
            },
            LossyImageFormat::Jpeg => Self::Jpeg {
                qscale: config.jpeg_config.qscale,
            },
        }
    }

    /// Format for lossless runs.
    pub fn lossless(config: &Config) -> Self {
        match config.lossless_scan_format {
            LosslessImageFormat::Webp => Self::WebpLossless,
            LosslessImageFormat::Png => Self::Png {
                compression_level: config.png_config.compression_level,
            },
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Webp { .. } | Self::WebpLossless => ".webp",
            Self::Jpeg { .. } => ".jpg",
            Self::Png { .. } => ".png",
        }
    }

    pub fn format_name(&self) -> &'static str {
        match self {
            Self::Webp { .. } | Self::WebpLossless => "WebP",
            Self::Jpeg { .. } => "JPEG",
            Self::Png { .. } => "PNG",
        }
    }

    pub fn ffmpeg_args(&self) -> Vec<String> {
        match self {
            Self::Webp { quality } => args(&["-quality", &quality.to_string()]),
            Self::Jpeg { qscale } => args(&["-qscale", &qscale.to_string()]),
            Self::WebpLossless => args(&["-lossless", "1"]),
            Self::Png { compression_level } => {
                args(&["-compression_level", &compression_level.to_string()])
            }
        }
    }
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve() {
        let config = Config::default();
        assert_eq!(AudioCodec::lossy(&config), AudioCodec::Opus { bitrate: 128 });
        assert_eq!(
            AudioCodec::lossless(&config),
            AudioCodec::Flac {
                compression_level: 8
            }
        );
        assert_eq!(ImageCodec::lossy(&config), ImageCodec::Webp { quality: 78 });
        assert_eq!(
            ImageCodec::lossless(&config),
            ImageCodec::Png {
                compression_level: 100
            }
        );
    }

    #[test]
    fn test_extensions() {
        assert_eq!(AudioCodec::Vorbis { bitrate: 320 }.extension(), ".ogg");
        assert_eq!(AudioCodec::Als.extension(), ".m4a");
        assert_eq!(
            AudioCodec::Usac {
                preset: "5".into()
            }
            .extension(),
            ".m4a"
        );
        assert_eq!(AudioCodec::Tta.extension(), ".tta");
        assert_eq!(ImageCodec::Jpeg { qscale: 2 }.extension(), ".jpg");
        assert_eq!(ImageCodec::WebpLossless.extension(), ".webp");
    }

    #[test]
    fn test_ffmpeg_args() {
        assert_eq!(
            AudioCodec::Mp3 {
                bitrate: 320,
                joint: true
            }
            .ffmpeg_args(),
            vec!["-c:a", "libmp3lame", "-b:a", "320k", "-joint_stereo", "1"]
        );
        assert_eq!(
            AudioCodec::Wavpack {
                compression_level: 6
            }
            .ffmpeg_args(),
            vec!["-c:a", "wavpack", "-compression_level", "6"]
        );
        assert_eq!(
            ImageCodec::Png {
                compression_level: 100
            }
            .ffmpeg_args(),
            vec!["-compression_level", "100"]
        );
    }

    #[test]
    fn test_qaac_args() {
        assert_eq!(
            AudioCodec::Aac {
                bitrate: 96,
                he: true
            }
            .qaac_args(),
            vec!["-v", "96", "--he"]
        );
        assert_eq!(AudioCodec::Alac.qaac_args(), vec!["--alac"]);
    }

    #[test]
    fn test_strategy() {
        assert_eq!(AudioCodec::Tta.strategy(), EncodeStrategy::Ffmpeg);
        assert!(!AudioCodec::Tta.needs_probed_tags());
        assert_eq!(AudioCodec::Alac.strategy(), EncodeStrategy::Qaac);
        assert_eq!(AudioCodec::Als.strategy(), EncodeStrategy::Mp4als);
        assert!(AudioCodec::Tak {
            preset: "p4m".into()
        }
        .needs_probed_tags());
    }

    #[test]
    fn test_config_selection() {
        let config = crate::config::load_config_from_str(
            r#"
            audio_codec = "aac"
            lossless_audio_codec = "tak"
            scan_format = "jpeg"
            [aac_config]
            he = true
            [tak_config]
            preset = "p2"
            "#,
        )
        .unwrap();

        assert_eq!(
            AudioCodec::lossy(&config),
            AudioCodec::Aac {
                bitrate: 128,
                he: true
            }
        );
        assert_eq!(
            AudioCodec::lossless(&config),
            AudioCodec::Tak {
                preset: "p2".into()
            }
        );
        assert_eq!(ImageCodec::lossy(&config), ImageCodec::Jpeg { qscale: 2 });
    }
}
