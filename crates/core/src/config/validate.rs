use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::{types::Config, ConfigError};

static TAK_PRESET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^p[0-4][em]?$").expect("tak preset pattern is valid"));
static USAC_PRESET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-g]$").expect("usac preset pattern is valid"));

/// Validate configuration
/// Currently validates:
/// - worker_num is at least 1
/// - codec parameters are within the ranges the encoders accept
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.worker_num == 0 {
        return Err(invalid("worker_num must be at least 1"));
    }

    for (key, bitrate) in [
        ("opus_config.bitrate", config.opus_config.bitrate),
        ("mp3_config.bitrate", config.mp3_config.bitrate),
        ("vorbis_config.bitrate", config.vorbis_config.bitrate),
        ("aac_config.bitrate", config.aac_config.bitrate),
    ] {
        if bitrate == 0 {
            return Err(invalid(format!("{} cannot be 0", key)));
        }
    }

    check_range(
        "flac_config.compression_level",
        config.flac_config.compression_level,
        0,
        12,
    )?;
    check_range(
        "wavpack_config.compression_level",
        config.wavpack_config.compression_level,
        0,
        8,
    )?;
    check_range("webp_config.quality", config.webp_config.quality, 0, 100)?;
    check_range("jpeg_config.qscale", config.jpeg_config.qscale, 1, 31)?;

    if !TAK_PRESET.is_match(&config.tak_config.preset) {
        return Err(invalid(format!(
            "tak_config.preset '{}' is not a takc preset (p0-p4 with optional e/m)",
            config.tak_config.preset
        )));
    }
    if !USAC_PRESET.is_match(&config.usac_config.preset) {
        return Err(invalid(format!(
            "usac_config.preset '{}' is not an exhale preset (0-9 or a-g)",
            config.usac_config.preset
        )));
    }

    Ok(())
}

fn check_range(key: &str, value: u32, min: u32, max: u32) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(invalid(format!(
            "{} must be between {} and {}, got {}",
            key, min, max, value
        )));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}
