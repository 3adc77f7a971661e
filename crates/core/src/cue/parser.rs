//! Line-oriented cue sheet state machine.

use once_cell::sync::Lazy;
use regex_lite::{Captures, Regex};

use super::error::CueError;
use super::types::{CueSheet, Timestamp, Track};
use crate::metadata::Metadata;

/// Characters replaced with `_` in filesystem-facing titles.
pub const ILLEGAL_TITLE_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Parser state: album-level header or inside the track list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Global,
    Track,
}

impl ParserState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Track => "track",
        }
    }
}

/// Directives the parser recognizes, in match precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Rem,
    Performer,
    Title,
    Songwriter,
    File,
    Catalog,
    Isrc,
    Track,
    Index,
}

impl Directive {
    fn name(&self) -> &'static str {
        match self {
            Self::Rem => "REM",
            Self::Performer => "PERFORMER",
            Self::Title => "TITLE",
            Self::Songwriter => "SONGWRITER",
            Self::File => "FILE",
            Self::Catalog => "CATALOG",
            Self::Isrc => "ISRC",
            Self::Track => "TRACK",
            Self::Index => "INDEX",
        }
    }
}

static MATCHERS: Lazy<Vec<(Directive, Regex)>> = Lazy::new(|| {
    [
        (Directive::Rem, r"^\s*REM\s+(.+?)\s+(.+)$"),
        (Directive::Performer, r"^\s*PERFORMER\s+(.+)$"),
        (Directive::Title, r"^\s*TITLE\s+(.+)$"),
        (Directive::Songwriter, r"^\s*SONGWRITER\s+(.+)$"),
        (Directive::File, r"^\s*FILE\s+.+$"),
        (Directive::Catalog, r"^\s*CATALOG\s+(.+)$"),
        (Directive::Isrc, r"^\s*ISRC\s+(.+)$"),
        (Directive::Track, r"^\s*TRACK\s+(\d+)\s+.+$"),
        (Directive::Index, r"^\s*INDEX\s+(\d+)\s+(.+)$"),
    ]
    .into_iter()
    .map(|(directive, pattern)| {
        (
            directive,
            Regex::new(pattern).expect("cue directive pattern is valid"),
        )
    })
    .collect()
});

/// Replaces characters that are illegal in file names with `_`.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if ILLEGAL_TITLE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Trims a directive value and strips surrounding quotes.
fn clean_value(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_string()
}

/// Parses decoded cue lines into a [`CueSheet`].
///
/// `file_name` is the audio file's base name without extension; it seeds the
/// global `title` tag.
pub fn parse_cue<S: AsRef<str>>(file_name: &str, lines: &[S]) -> Result<CueSheet, CueError> {
    let mut parser = CueParser::new(file_name);
    for (idx, line) in lines.iter().enumerate() {
        parser.feed_line(idx + 1, line.as_ref())?;
    }
    parser.finish()
}

#[derive(Debug)]
struct PendingTrack {
    index: u32,
    title: String,
    start_time: Option<Timestamp>,
    end_time: Option<Timestamp>,
    metadata: Metadata,
}

/// Incremental cue parser.
#[derive(Debug)]
pub struct CueParser {
    state: ParserState,
    global: Metadata,
    tracks: Vec<PendingTrack>,
}

impl CueParser {
    pub fn new(file_name: &str) -> Self {
        let mut global = Metadata::new();
        global.insert("title", file_name);
        Self {
            state: ParserState::Global,
            global,
            tracks: Vec::new(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Feeds one line. `line_no` is only used in error messages.
    pub fn feed_line(&mut self, line_no: usize, line: &str) -> Result<(), CueError> {
        let line = line.trim_end_matches(['\r', '\n']);

        let Some((directive, caps)) = MATCHERS
            .iter()
            .find_map(|(directive, re)| re.captures(line).map(|caps| (*directive, caps)))
        else {
            return Ok(());
        };

        match self.state {
            ParserState::Global => self.handle_global(directive, &caps, line_no),
            ParserState::Track => self.handle_track(directive, &caps, line_no),
        }
    }

    /// Finalizes the sheet, checking every track got a start position.
    pub fn finish(self) -> Result<CueSheet, CueError> {
        let tracks = self
            .tracks
            .into_iter()
            .map(|t| {
                let start_time = t.start_time.ok_or(CueError::MissingStart { index: t.index })?;
                Ok(Track {
                    index: t.index,
                    title: t.title,
                    start_time,
                    end_time: t.end_time,
                    metadata: t.metadata,
                })
            })
            .collect::<Result<Vec<_>, CueError>>()?;

        Ok(CueSheet {
            metadata: self.global,
            tracks,
        })
    }

    fn handle_global(
        &mut self,
        directive: Directive,
        caps: &Captures<'_>,
        line_no: usize,
    ) -> Result<(), CueError> {
        match directive {
            Directive::Rem => {
                let key = clean_value(&caps[1]).to_lowercase();
                self.global.insert(key, clean_value(&caps[2]));
            }
            Directive::Performer => self.global.insert("performer", clean_value(&caps[1])),
            Directive::Title => self.global.insert("album", clean_value(&caps[1])),
            Directive::Songwriter => self.global.insert("songwriter", clean_value(&caps[1])),
            Directive::Catalog => self.global.insert("catalog", clean_value(&caps[1])),
            Directive::File => self.state = ParserState::Track,
            Directive::Isrc | Directive::Track | Directive::Index => {
                return Err(self.unexpected(directive, line_no));
            }
        }
        Ok(())
    }

    fn handle_track(
        &mut self,
        directive: Directive,
        caps: &Captures<'_>,
        line_no: usize,
    ) -> Result<(), CueError> {
        match directive {
            Directive::Track => {
                let expected = self.tracks.len() as u32 + 1;
                let found: u32 = caps[1].parse().unwrap_or(0);
                if found != expected {
                    return Err(CueError::TrackOutOfSequence {
                        expected,
                        found,
                        line: line_no,
                    });
                }
                self.start_track(found);
            }
            Directive::Index => {
                if caps[1].parse::<u32>() != Ok(1) {
                    return Ok(());
                }
                let value = caps[2].trim();
                let timestamp =
                    Timestamp::parse_msf(value).ok_or_else(|| CueError::InvalidTimestamp {
                        value: value.to_string(),
                        line: line_no,
                    })?;
                self.current_track(directive, line_no)?.start_time = Some(timestamp);
                let count = self.tracks.len();
                if count > 1 {
                    self.tracks[count - 2].end_time = Some(timestamp);
                }
            }
            Directive::Performer => {
                let value = clean_value(&caps[1]);
                self.current_track(directive, line_no)?
                    .metadata
                    .insert("performer", value);
            }
            Directive::Songwriter => {
                let value = clean_value(&caps[1]);
                self.current_track(directive, line_no)?
                    .metadata
                    .insert("songwriter", value);
            }
            Directive::Isrc => {
                let value = clean_value(&caps[1]);
                self.current_track(directive, line_no)?
                    .metadata
                    .insert("isrc", value);
            }
            Directive::Title => {
                let value = clean_value(&caps[1]);
                let track = self.current_track(directive, line_no)?;
                track.title = sanitize_title(&value);
                track.metadata.insert("title", value);
            }
            Directive::Rem => {
                let key = clean_value(&caps[1]).to_lowercase();
                let value = clean_value(&caps[2]);
                self.current_track(directive, line_no)?
                    .metadata
                    .insert(key, value);
            }
            Directive::File | Directive::Catalog => {
                return Err(self.unexpected(directive, line_no));
            }
        }
        Ok(())
    }

    fn start_track(&mut self, index: u32) {
        let mut metadata = self.global.clone();
        let title = format!("{} {:02}", self.global.get("title").unwrap_or_default(), index);
        metadata.insert("track", index.to_string());
        metadata.insert("title", title.clone());

        self.tracks.push(PendingTrack {
            index,
            title: sanitize_title(&title),
            start_time: None,
            end_time: None,
            metadata,
        });
    }

    fn current_track(
        &mut self,
        directive: Directive,
        line_no: usize,
    ) -> Result<&mut PendingTrack, CueError> {
        self.tracks.last_mut().ok_or(CueError::NoCurrentTrack {
            directive: directive.name(),
            line: line_no,
        })
    }

    fn unexpected(&self, directive: Directive, line_no: usize) -> CueError {
        CueError::UnexpectedDirective {
            state: self.state.name(),
            directive: directive.name(),
            line: line_no,
        }
    }
}
