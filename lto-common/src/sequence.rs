//! Sequencing and initial renaming
//!
//! Orders parsed files slowest to fastest, then by pitch class starting at C,
//! and gives each a numbered name:
//! `{base}_{index:02}_key{key}_{bpm}bpm{ext}`.

use serde::Serialize;

use crate::diagnostics::{Diagnostic, Issue};
use crate::pitch::{key_rank, UNRANKED};
use crate::track_name::ParsedFile;

/// A parsed file placed in the batch order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequencedFile {
    pub parsed: ParsedFile,
    /// 1-based position after sorting
    pub order_index: usize,
    pub key_rank: u8,
    pub initial_name: String,
}

/// Sequencer output: ordered files plus any diagnostics raised on the way
#[derive(Debug, Clone, Default)]
pub struct Sequenced {
    pub files: Vec<SequencedFile>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Render the numbered name for a file at `order_index`
///
/// Index width is a minimum of two digits, so `100` renders as `100`.
pub fn initial_name(parsed: &ParsedFile, order_index: usize) -> String {
    format!(
        "{}_{:02}_key{}_{}bpm{}",
        parsed.base_name, order_index, parsed.key, parsed.bpm, parsed.extension
    )
}

/// Sort parsed files by `(bpm, key rank)` and assign order indices
///
/// The sort is stable: equal BPM and equal rank keep their input order.
/// An empty input yields no files and an [`Issue::EmptyBatch`] diagnostic.
pub fn sequence(parsed: Vec<ParsedFile>) -> Sequenced {
    if parsed.is_empty() {
        return Sequenced {
            files: Vec::new(),
            diagnostics: vec![Diagnostic::from(Issue::EmptyBatch)],
        };
    }

    let mut diagnostics = Vec::new();
    let mut ranked: Vec<(u8, ParsedFile)> = parsed
        .into_iter()
        .map(|file| {
            let rank = key_rank(&file.key);
            if rank == UNRANKED {
                diagnostics.push(Diagnostic::from(Issue::RankFailure {
                    key: file.key.clone(),
                }));
            }
            (rank, file)
        })
        .collect();

    ranked.sort_by_key(|(rank, file)| (file.bpm, *rank));

    let files: Vec<SequencedFile> = ranked
        .into_iter()
        .enumerate()
        .map(|(i, (key_rank, parsed))| {
            let order_index = i + 1;
            SequencedFile {
                initial_name: initial_name(&parsed, order_index),
                parsed,
                order_index,
                key_rank,
            }
        })
        .collect();

    tracing::info!(files = files.len(), "Sequenced batch");

    Sequenced { files, diagnostics }
}
