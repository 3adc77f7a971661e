use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
///
/// Built once at startup and shared read-only by every component.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Concurrent conversion jobs.
    pub worker_num: usize,
    /// `-loglevel` passed to every ffmpeg/ffprobe invocation.
    pub ffmpeg_log_level: String,
    pub audio_codec: LossyAudioCodec,
    pub lossless_audio_codec: LosslessAudioCodec,
    pub scan_format: LossyImageFormat,
    pub lossless_scan_format: LosslessImageFormat,
    /// Split lossless audio with a companion cue sheet into tracks.
    pub split_lossless_cue: bool,
    /// Copy files whose extension has no handler instead of skipping them.
    pub copy_unmapped: bool,
    pub executable: ExecutableConfig,
    pub opus_config: OpusConfig,
    pub mp3_config: Mp3Config,
    pub vorbis_config: VorbisConfig,
    pub aac_config: AacConfig,
    pub usac_config: UsacConfig,
    pub flac_config: FlacConfig,
    pub wavpack_config: WavpackConfig,
    pub tak_config: TakConfig,
    pub webp_config: WebpConfig,
    pub jpeg_config: JpegConfig,
    pub png_config: PngConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_num: default_worker_num(),
            ffmpeg_log_level: default_ffmpeg_log_level(),
            audio_codec: LossyAudioCodec::default(),
            lossless_audio_codec: LosslessAudioCodec::default(),
            scan_format: LossyImageFormat::default(),
            lossless_scan_format: LosslessImageFormat::default(),
            split_lossless_cue: true,
            copy_unmapped: false,
            executable: ExecutableConfig::default(),
            opus_config: OpusConfig::default(),
            mp3_config: Mp3Config::default(),
            vorbis_config: VorbisConfig::default(),
            aac_config: AacConfig::default(),
            usac_config: UsacConfig::default(),
            flac_config: FlacConfig::default(),
            wavpack_config: WavpackConfig::default(),
            tak_config: TakConfig::default(),
            webp_config: WebpConfig::default(),
            jpeg_config: JpegConfig::default(),
            png_config: PngConfig::default(),
        }
    }
}

fn default_worker_num() -> usize {
    4
}

fn default_ffmpeg_log_level() -> String {
    "error".to_string()
}

/// Target codec for lossy audio runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LossyAudioCodec {
    #[default]
    Opus,
    Aac,
    Usac,
    Vorbis,
    Mp3,
}

/// Target codec for lossless audio runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LosslessAudioCodec {
    #[default]
    Flac,
    Alac,
    Tak,
    Wavpack,
    Tta,
    Als,
}

/// Target format for images in lossy runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LossyImageFormat {
    #[default]
    Webp,
    Jpeg,
}

/// Target format for images in lossless runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LosslessImageFormat {
    Webp,
    #[default]
    Png,
}

/// Paths of the external tools. Bare names are resolved through `PATH`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutableConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub qaac: PathBuf,
    pub takc: PathBuf,
    pub exhale: PathBuf,
    pub mp4als: PathBuf,
}

impl Default for ExecutableConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            qaac: default_qaac(),
            takc: default_takc(),
            exhale: default_exhale(),
            mp4als: default_mp4als(),
        }
    }
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_qaac() -> PathBuf {
    PathBuf::from("qaac")
}

fn default_takc() -> PathBuf {
    PathBuf::from("takc")
}

fn default_exhale() -> PathBuf {
    PathBuf::from("exhale")
}

fn default_mp4als() -> PathBuf {
    PathBuf::from("mp4als")
}

/// Codec parameter groups. Every field falls back to the documented default.
macro_rules! codec_config {
    ($(#[$doc:meta])* $name:ident { $($field:ident: $ty:ty = $default:expr),+ $(,)? }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Deserialize, Serialize)]
        #[serde(default)]
        pub struct $name {
            $(pub $field: $ty,)+
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $($field: $default,)+
                }
            }
        }
    };
}

codec_config!(
    /// libopus settings
    OpusConfig { bitrate: u32 = 128 }
);

codec_config!(
    /// LAME settings
    Mp3Config { bitrate: u32 = 320, joint: bool = true }
);

codec_config!(
    /// libvorbis settings
    VorbisConfig { bitrate: u32 = 320 }
);

codec_config!(
    /// qaac AAC settings; `bitrate` is passed as the `-v` target and `he`
    /// selects HE-AAC.
    AacConfig { bitrate: u32 = 128, he: bool = false }
);

codec_config!(
    /// exhale preset (`0`-`9` or `a`-`g`)
    UsacConfig { preset: String = "5".to_string() }
);

codec_config!(FlacConfig { compression_level: u32 = 8 });

codec_config!(WavpackConfig { compression_level: u32 = 6 });

codec_config!(
    /// takc preset, e.g. `p4m`
    TakConfig { preset: String = "p4m".to_string() }
);

codec_config!(WebpConfig { quality: u32 = 78 });

codec_config!(JpegConfig { qscale: u32 = 2 });

codec_config!(PngConfig { compression_level: u32 = 100 });
