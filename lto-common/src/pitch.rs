//! Pitch-class ranking of musical keys
//!
//! Maps a key string (`Am`, `F#`, `Bbm`, ...) to its chromatic pitch class
//! starting at C, so keys can be used as a sort key. Enharmonic spellings
//! share a rank; the major/minor marker is ignored.

use once_cell::sync::Lazy;
use regex::Regex;

/// Rank given to keys whose note cannot be read; sorts after every pitch class
pub const UNRANKED: u8 = 99;

static NOTE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-g][#b]?)").expect("note token pattern is valid"));

/// Chromatic position of a lower-case note spelling
fn pitch_class(note: &str) -> Option<u8> {
    let class = match note {
        "c" | "b#" => 0,
        "c#" | "db" => 1,
        "d" => 2,
        "d#" | "eb" => 3,
        "e" | "fb" => 4,
        "f" | "e#" => 5,
        "f#" | "gb" => 6,
        "g" => 7,
        "g#" | "ab" => 8,
        "a" => 9,
        "a#" | "bb" => 10,
        "b" | "cb" => 11,
        _ => return None,
    };
    Some(class)
}

/// Pitch-class rank of `key` in `0..=11`, or [`UNRANKED`]
///
/// Callers that report problems turn an [`UNRANKED`] result into an
/// [`Issue::RankFailure`](crate::diagnostics::Issue::RankFailure).
///
/// # Examples
/// ```
/// use lto_common::pitch::{key_rank, UNRANKED};
///
/// assert_eq!(key_rank("C"), 0);
/// assert_eq!(key_rank("Db"), key_rank("C#"));
/// assert_eq!(key_rank("Am"), 9);
/// assert_eq!(key_rank("H"), UNRANKED);
/// ```
pub fn key_rank(key: &str) -> u8 {
    let lowered = key.to_lowercase();
    NOTE_TOKEN
        .captures(&lowered)
        .and_then(|caps| pitch_class(&caps[1]))
        .unwrap_or(UNRANKED)
}
