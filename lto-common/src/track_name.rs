//! Filename metadata parsing
//!
//! Extracts base name, key, BPM and extension from names shaped like
//! `CBOH_Orchestral_Horror_63_keyCm_60bpm.wav`.
//!
//! Two attempts run in order:
//! 1. **Strict**: the whole name must be `<base>_key<Key>_<digits>bpm.wav`.
//! 2. **Relaxed** (best-effort): `_key<Key>` and `_<digits>bpm` may appear
//!    anywhere, in any order. The base is everything before the first literal
//!    `_key` (case-sensitive), or the whole name if that literal is absent.
//!    This is looser than the strict capture on purpose and must stay that way:
//!    names with several `_key`-like runs can yield a different base than the
//!    strict pattern would.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::diagnostics::Issue;

static STRICT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.*?)_key([A-G][#b]?m?)_([0-9]+)bpm(\.wav)$")
        .expect("strict filename pattern is valid")
});

static KEY_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)_key([A-G][#b]?m?)").expect("key token pattern is valid"));

static BPM_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)_([0-9]+)bpm").expect("bpm token pattern is valid"));

const WAV_EXTENSION: &str = ".wav";

/// Which parse attempt produced a [`ParsedFile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsePattern {
    Strict,
    Relaxed,
}

/// Metadata read from an accepted filename
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedFile {
    /// Literal uploaded filename (key into raw byte storage)
    pub original_name: String,
    pub base_name: String,
    /// Key as captured, e.g. `Am`, `F#`, `bbm`
    pub key: String,
    pub bpm: u32,
    /// Extension with leading dot, case preserved
    pub extension: String,
    pub pattern: ParsePattern,
}

impl ParsedFile {
    /// Rebuild `{base}_key{key}_{bpm}bpm{ext}` from the parsed fields
    pub fn structured_name(&self) -> String {
        format!(
            "{}_key{}_{}bpm{}",
            self.base_name, self.key, self.bpm, self.extension
        )
    }
}

/// Why a filename was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseFailureReason {
    /// No `_key<Key>` token, no `_<digits>bpm` token, or neither
    MissingTokens,
    /// Tokens present but the file is not a `.wav`
    NotWav { extension: String },
    /// BPM digits do not fit an unsigned 32-bit integer
    BpmOutOfRange { digits: String },
}

impl fmt::Display for ParseFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFailureReason::MissingTokens => write!(f, "missing key or bpm token"),
            ParseFailureReason::NotWav { extension } if extension.is_empty() => {
                write!(f, "no file extension, expected .wav")
            }
            ParseFailureReason::NotWav { extension } => {
                write!(f, "extension {} is not .wav", extension)
            }
            ParseFailureReason::BpmOutOfRange { digits } => {
                write!(f, "bpm {} is out of range", digits)
            }
        }
    }
}

/// Result of parsing one filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Parsed(ParsedFile),
    NotParsed {
        original_name: String,
        reason: ParseFailureReason,
    },
}

impl ParseOutcome {
    pub fn parsed(&self) -> Option<&ParsedFile> {
        match self {
            ParseOutcome::Parsed(file) => Some(file),
            ParseOutcome::NotParsed { .. } => None,
        }
    }

    /// The [`Issue`] describing a rejection, if any
    pub fn issue(&self) -> Option<Issue> {
        match self {
            ParseOutcome::Parsed(_) => None,
            ParseOutcome::NotParsed {
                original_name,
                reason,
            } => Some(Issue::ParseFailure {
                file: original_name.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

/// Parse key, BPM and extension out of a filename
///
/// # Examples
/// ```
/// use lto_common::track_name::{parse_filename, ParseOutcome};
///
/// let outcome = parse_filename("MyTrack_Loop1_keyAm_120bpm.wav");
/// let parsed = outcome.parsed().unwrap();
/// assert_eq!(parsed.base_name, "MyTrack_Loop1");
/// assert_eq!(parsed.key, "Am");
/// assert_eq!(parsed.bpm, 120);
///
/// assert!(matches!(parse_filename("loop.wav"), ParseOutcome::NotParsed { .. }));
/// ```
pub fn parse_filename(filename: &str) -> ParseOutcome {
    let outcome = match parse_strict(filename) {
        Some(result) => result,
        None => parse_relaxed(filename),
    };

    match &outcome {
        ParseOutcome::Parsed(parsed) => tracing::debug!(
            file = %filename,
            bpm = parsed.bpm,
            key = %parsed.key,
            pattern = ?parsed.pattern,
            "Parsed filename metadata"
        ),
        ParseOutcome::NotParsed { reason, .. } => {
            tracing::debug!(file = %filename, reason = %reason, "Filename not parsed")
        }
    }

    outcome
}

/// Anchored attempt; `None` means "try the relaxed pattern"
fn parse_strict(filename: &str) -> Option<ParseOutcome> {
    let caps = STRICT_PATTERN.captures(filename)?;
    let digits = &caps[3];

    let outcome = match digits.parse::<u32>() {
        Ok(bpm) => ParseOutcome::Parsed(ParsedFile {
            original_name: filename.to_string(),
            base_name: caps[1].to_string(),
            key: caps[2].to_string(),
            bpm,
            extension: caps[4].to_string(),
            pattern: ParsePattern::Strict,
        }),
        Err(_) => not_parsed(
            filename,
            ParseFailureReason::BpmOutOfRange {
                digits: digits.to_string(),
            },
        ),
    };
    Some(outcome)
}

fn parse_relaxed(filename: &str) -> ParseOutcome {
    let key = KEY_TOKEN.captures(filename).map(|caps| caps[1].to_string());
    let digits = BPM_TOKEN.captures(filename).map(|caps| caps[1].to_string());

    let (key, digits) = match (key, digits) {
        (Some(key), Some(digits)) => (key, digits),
        _ => return not_parsed(filename, ParseFailureReason::MissingTokens),
    };

    let bpm = match digits.parse::<u32>() {
        Ok(bpm) => bpm,
        Err(_) => return not_parsed(filename, ParseFailureReason::BpmOutOfRange { digits }),
    };

    let extension = file_extension(filename);
    if !extension.eq_ignore_ascii_case(WAV_EXTENSION) {
        return not_parsed(filename, ParseFailureReason::NotWav { extension });
    }

    let base_name = match filename.find("_key") {
        Some(idx) => filename[..idx].to_string(),
        None => filename.to_string(),
    };

    ParseOutcome::Parsed(ParsedFile {
        original_name: filename.to_string(),
        base_name,
        key,
        bpm,
        extension,
        pattern: ParsePattern::Relaxed,
    })
}

/// Extension with its leading dot, or empty when the name has none
fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

fn not_parsed(filename: &str, reason: ParseFailureReason) -> ParseOutcome {
    ParseOutcome::NotParsed {
        original_name: filename.to_string(),
        reason,
    }
}
