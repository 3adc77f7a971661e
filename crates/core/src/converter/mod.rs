//! Converter module for transcoding audio and images.
//!
//! This module provides the `Converter` trait and implementations that drive
//! ffmpeg and the standalone encoders (qaac, takc, exhale, mp4als) through
//! [`crate::process::ProcessPipeline`].
//!
//! # Features
//!
//! - Lossy audio: Opus, MP3, Vorbis, AAC (qaac), USAC (exhale)
//! - Lossless audio: FLAC, ALAC (qaac), TAK (takc), WavPack, TTA, ALS (mp4als)
//! - Images: WebP, JPEG, lossless WebP, PNG
//! - Per-track extraction from cue-described files, with per-track tags
//!
//! # Example
//!
//! ```ignore
//! use condense_core::converter::{AudioConverter, ConversionJob, Converter};
//!
//! let converter = AudioConverter::lossless(&config);
//! let job = ConversionJob::new("/music/a/disc.wav", "/music", "/out");
//! let output = converter.convert_whole(&job, &cancel).await?;
//! println!("wrote {}", output.display());
//! ```

mod audio;
mod codec;
mod error;
mod image;
mod probe;
mod traits;
mod types;

pub use audio::AudioConverter;
pub use codec::{AudioCodec, EncodeStrategy, ImageCodec};
pub use error::ConverterError;
pub use image::ImageConverter;
pub use probe::{parse_probe_tags, probe_tags};
pub use traits::Converter;
pub use types::{temp_sibling, ConversionJob, TrackJob, TrackOutcome};
