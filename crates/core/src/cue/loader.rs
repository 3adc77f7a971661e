//! Reads cue sheets of unknown encoding into text lines.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, GBK, SHIFT_JIS, UTF_8, WINDOWS_1252};
use std::path::Path;
use tracing::debug;

use super::error::CueError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Encodings tried after the detector's guess, in order.
/// Windows-1252 maps every byte, so it goes last.
pub const FALLBACK_ENCODINGS: &[&Encoding] = &[UTF_8, SHIFT_JIS, GBK, WINDOWS_1252];

/// Loads a cue file and returns its lines with terminators preserved.
///
/// The bytes are read once. The detector's guess is tried first (after UTF-8
/// when the file starts with a byte order mark), then
/// [`FALLBACK_ENCODINGS`]; the first encoding that decodes without errors wins.
pub async fn load_cue_lines(path: &Path) -> Result<Vec<String>, CueError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| CueError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    // A UTF-8 BOM is authoritative; the detector does not sniff it.
    let mut candidates = Vec::with_capacity(FALLBACK_ENCODINGS.len() + 2);
    if bytes.starts_with(UTF8_BOM) {
        candidates.push(UTF_8);
    }
    candidates.push(guess_encoding(&bytes));
    candidates.extend(FALLBACK_ENCODINGS.iter().copied());

    let text = decode_with_candidates(&bytes, &candidates).ok_or_else(|| {
        CueError::Undecodable {
            path: path.to_path_buf(),
        }
    })?;

    Ok(split_lines(&text))
}

/// Best guess from the encoding detector.
pub fn guess_encoding(bytes: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

/// Decodes `bytes` with the first candidate that accepts them.
///
/// A leading UTF-8 byte order mark is stripped when decoding as UTF-8.
pub fn decode_with_candidates(bytes: &[u8], candidates: &[&'static Encoding]) -> Option<String> {
    for encoding in candidates {
        let input = if *encoding == UTF_8 {
            bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
        } else {
            bytes
        };

        match encoding.decode_without_bom_handling_and_without_replacement(input) {
            Some(text) => {
                debug!("Decoded cue sheet as {}", encoding.name());
                return Some(text.into_owned());
            }
            None => continue,
        }
    }
    None
}

/// Splits text into lines, keeping each line's terminator.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}
