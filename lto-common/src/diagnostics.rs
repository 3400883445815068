//! Pipeline diagnostics
//!
//! Every recoverable problem the pipeline meets is an [`Issue`]. Issues are
//! never propagated as `Err`; they are collected alongside the stage output
//! and surfaced to the user as [`Diagnostic`] records, so one bad file never
//! aborts the batch.

use serde::Serialize;
use thiserror::Error;

use crate::range_edit::EditKind;
use crate::track_name::ParseFailureReason;

/// Problems recorded while running the pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// Filename matches neither recognized pattern, or is not a `.wav`
    #[error(
        "Could not parse metadata (key, bpm) from filename: {file} ({reason}). \
         Ensure it follows the pattern '..._keyKey_BPMbpm.wav'. Skipping this file."
    )]
    ParseFailure {
        file: String,
        reason: ParseFailureReason,
    },

    /// Note token of a key could not be read; the key sorts last
    #[error("Could not parse note from key: {key}. Sorting it last.")]
    RankFailure { key: String },

    /// Edit range falls outside the filename; the initial name is kept
    #[error("Invalid {operation} for: {name}")]
    EditRangeInvalid { name: String, operation: EditKind },

    /// Edit fits but yields an empty name or one with a path separator
    #[error("Invalid {operation} for: {name} (result {result:?} is not a plain filename)")]
    EditNameInvalid {
        name: String,
        operation: EditKind,
        result: String,
    },

    /// Byte payload absent for a filename that should have one
    #[error("Internal error: Could not find data for {file}")]
    InternalDataMissing { file: String },

    /// Non-empty upload where nothing parsed
    #[error(
        "No files could be parsed successfully. \
         Ensure filenames match the required format `..._keyKey_BPMbpm.wav`."
    )]
    EmptyBatch,
}

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Pipeline stage that produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Parse,
    Rank,
    Sequence,
    Edit,
    Archive,
}

impl Issue {
    pub fn severity(&self) -> Severity {
        match self {
            Issue::InternalDataMissing { .. } => Severity::Error,
            _ => Severity::Warning,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Issue::ParseFailure { .. } => Stage::Parse,
            Issue::RankFailure { .. } => Stage::Rank,
            Issue::EditRangeInvalid { .. } | Issue::EditNameInvalid { .. } => Stage::Edit,
            Issue::InternalDataMissing { .. } => Stage::Archive,
            Issue::EmptyBatch => Stage::Sequence,
        }
    }

    /// Filename the issue concerns, if it is tied to one file
    pub fn file(&self) -> Option<&str> {
        match self {
            Issue::ParseFailure { file, .. } | Issue::InternalDataMissing { file } => Some(file),
            Issue::EditRangeInvalid { name, .. } | Issue::EditNameInvalid { name, .. } => {
                Some(name)
            }
            Issue::RankFailure { .. } | Issue::EmptyBatch => None,
        }
    }
}

/// User-facing diagnostic record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub message: String,
}

impl Diagnostic {
    /// Batch-level note not tied to an [`Issue`] or a single file
    pub fn new(severity: Severity, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            severity,
            stage,
            file: None,
            message: message.into(),
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Emit this diagnostic through `tracing` at a level matching its severity
    pub fn log(&self) {
        let file = self.file.as_deref().unwrap_or("-");
        match self.severity {
            Severity::Info => tracing::info!(stage = ?self.stage, file = %file, "{}", self.message),
            Severity::Warning => tracing::warn!(stage = ?self.stage, file = %file, "{}", self.message),
            Severity::Error => tracing::error!(stage = ?self.stage, file = %file, "{}", self.message),
        }
    }
}

impl From<&Issue> for Diagnostic {
    fn from(issue: &Issue) -> Self {
        Self {
            severity: issue.severity(),
            stage: issue.stage(),
            file: issue.file().map(str::to_string),
            message: issue.to_string(),
        }
    }
}

impl From<Issue> for Diagnostic {
    fn from(issue: Issue) -> Self {
        Diagnostic::from(&issue)
    }
}
