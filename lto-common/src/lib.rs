//! # LTO Common Library
//!
//! Shared code for the LANDR Track Order workspace:
//! - Filename metadata parsing (key / BPM / extension)
//! - Pitch-class ranking of musical keys
//! - Sequencing and initial renaming
//! - Positional range edits with highlighted previews
//! - Diagnostics, error types and configuration loading

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod pitch;
pub mod range_edit;
pub mod sequence;
pub mod track_name;

pub use diagnostics::{Diagnostic, Issue, Severity, Stage};
pub use error::{Error, Result};
pub use range_edit::{apply_edit, EditOp, EditResult};
pub use sequence::{sequence, SequencedFile};
pub use track_name::{parse_filename, ParseOutcome, ParsedFile};
