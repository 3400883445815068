//! Upload session and pipeline coordination
//!
//! A [`Session`] owns everything derived from one upload set: the raw bytes
//! keyed by original filename, the parse results, the sequenced names and the
//! edited names. It is never patched in place. A new upload builds a new
//! session; an edit change recomputes the whole edited stage.

use axum::body::Bytes;
use chrono::{DateTime, Utc};
use lto_common::diagnostics::{Diagnostic, Issue, Severity, Stage};
use lto_common::range_edit::{apply_edit_batch, EditOp};
use lto_common::sequence::{sequence, Sequenced, SequencedFile};
use lto_common::track_name::{parse_filename, ParseFailureReason, ParseOutcome, ParsePattern};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::archive::{ArchiveEntry, ArchiveWriter};

/// One uploaded file as supplied by the upload source
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub data: Bytes,
}

impl Upload {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Parse status of one upload, for the uploaded files summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadState {
    Parsed {
        bpm: u32,
        key: String,
        pattern: ParsePattern,
    },
    NotParsed {
        reason: ParseFailureReason,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadStatus {
    pub original_name: String,
    pub size_bytes: usize,
    #[serde(flatten)]
    pub state: UploadState,
}

/// Final output unit for one sequenced file
#[derive(Debug, Clone, Serialize)]
pub struct EditedFile {
    pub order_index: usize,
    pub original_name: String,
    pub initial_name: String,
    pub final_name: String,
    pub preview_markup: String,
    pub valid: bool,
    #[serde(skip)]
    pub data: Option<Bytes>,
}

/// Serializable snapshot of a session for the display surface
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub uploads: Vec<UploadStatus>,
    pub sequenced: Vec<SequencedFile>,
    pub edit: EditOp,
    pub files: Vec<EditedFile>,
    pub error_occurred: bool,
    pub download_ready: bool,
    pub archive_name: String,
    pub diagnostics: Vec<Diagnostic>,
}

const EDIT_ERROR_MESSAGE: &str = "One or more filenames encountered an error or invalid \
    parameters during renaming. Please check warnings and adjust inputs. \
    Download will use the names shown as final.";

/// Pipeline context for one upload set
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    raw: HashMap<String, Bytes>,
    uploads: Vec<UploadStatus>,
    sequenced: Vec<SequencedFile>,
    /// Parse and sequence diagnostics; fixed for the life of the session
    upload_diagnostics: Vec<Diagnostic>,
    edit: EditOp,
    edited: Vec<EditedFile>,
    /// Edit and archive diagnostics; replaced on every edit change
    edit_diagnostics: Vec<Diagnostic>,
    error_occurred: bool,
    data_missing: bool,
}

impl Session {
    /// Build a fresh session from an upload set
    ///
    /// Every upload is stored, including ones that fail to parse. Duplicate
    /// filenames collide in the byte store: the last upload wins. The edit
    /// operation starts at its no-op default.
    pub fn from_uploads(uploads: Vec<Upload>) -> Self {
        let id = Uuid::new_v4();
        tracing::info!(session_id = %id, files = uploads.len(), "New upload session");

        let mut raw = HashMap::with_capacity(uploads.len());
        let mut statuses = Vec::with_capacity(uploads.len());
        let mut parsed = Vec::new();
        let mut upload_diagnostics = Vec::new();

        for upload in uploads {
            let outcome = parse_filename(&upload.name);
            let state = match &outcome {
                ParseOutcome::Parsed(file) => UploadState::Parsed {
                    bpm: file.bpm,
                    key: file.key.clone(),
                    pattern: file.pattern,
                },
                ParseOutcome::NotParsed { reason, .. } => UploadState::NotParsed {
                    reason: reason.clone(),
                },
            };

            if let Some(issue) = outcome.issue() {
                upload_diagnostics.push(Diagnostic::from(issue));
            }
            if let ParseOutcome::Parsed(file) = outcome {
                parsed.push(file);
            }

            statuses.push(UploadStatus {
                original_name: upload.name.clone(),
                size_bytes: upload.data.len(),
                state,
            });

            if raw.insert(upload.name.clone(), upload.data).is_some() {
                tracing::warn!(file = %upload.name, "Duplicate upload filename; keeping the last");
            }
        }

        let Sequenced { files, diagnostics } = if statuses.is_empty() {
            Sequenced::default()
        } else {
            sequence(parsed)
        };
        upload_diagnostics.extend(diagnostics);

        for diagnostic in &upload_diagnostics {
            diagnostic.log();
        }

        let mut session = Self {
            id,
            created_at: Utc::now(),
            raw,
            uploads: statuses,
            sequenced: files,
            upload_diagnostics,
            edit: EditOp::default(),
            edited: Vec::new(),
            edit_diagnostics: Vec::new(),
            error_occurred: false,
            data_missing: false,
        };
        session.recompute_edits();
        session
    }

    /// Replace the edit operation and recompute every final name
    pub fn set_edit(&mut self, op: EditOp) {
        tracing::debug!(session_id = %self.id, operation = ?op, "Edit operation changed");
        self.edit = op;
        self.recompute_edits();
    }

    fn recompute_edits(&mut self) {
        let batch = apply_edit_batch(
            self.sequenced.iter().map(|f| f.initial_name.as_str()),
            &self.edit,
        );

        let mut diagnostics = Vec::new();
        let mut data_missing = false;
        let mut edited = Vec::with_capacity(self.sequenced.len());

        for (file, result) in self.sequenced.iter().zip(batch.results) {
            if let Some(issue) = &result.issue {
                diagnostics.push(Diagnostic::from(issue));
            }

            let original_name = &file.parsed.original_name;
            let data = self.raw.get(original_name).cloned();
            if data.is_none() {
                data_missing = true;
                diagnostics.push(Diagnostic::from(Issue::InternalDataMissing {
                    file: original_name.clone(),
                }));
            }

            edited.push(EditedFile {
                order_index: file.order_index,
                original_name: original_name.clone(),
                initial_name: file.initial_name.clone(),
                final_name: result.final_name,
                preview_markup: result.preview.to_html(),
                valid: result.valid,
                data,
            });
        }

        if batch.error_occurred {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                Stage::Edit,
                EDIT_ERROR_MESSAGE,
            ));
        }

        let mut seen = HashSet::new();
        for file in &edited {
            if !seen.insert(file.final_name.as_str()) {
                diagnostics.push(
                    Diagnostic::new(
                        Severity::Warning,
                        Stage::Archive,
                        format!(
                            "Duplicate final filename {}: only the last file with this name is kept in the archive",
                            file.final_name
                        ),
                    )
                    .with_file(file.final_name.clone()),
                );
            }
        }

        for diagnostic in &diagnostics {
            diagnostic.log();
        }

        self.edited = edited;
        self.edit_diagnostics = diagnostics;
        self.error_occurred = batch.error_occurred || data_missing;
        self.data_missing = data_missing;
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn edit(&self) -> &EditOp {
        &self.edit
    }

    pub fn uploads(&self) -> &[UploadStatus] {
        &self.uploads
    }

    pub fn sequenced(&self) -> &[SequencedFile] {
        &self.sequenced
    }

    pub fn edited(&self) -> &[EditedFile] {
        &self.edited
    }

    /// True when any file failed to edit or lost its payload
    pub fn error_occurred(&self) -> bool {
        self.error_occurred
    }

    /// All diagnostics, upload stage first
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.upload_diagnostics
            .iter()
            .chain(self.edit_diagnostics.iter())
            .cloned()
            .collect()
    }

    /// An archive is offered only when files exist and every payload is present
    pub fn download_ready(&self) -> bool {
        !self.edited.is_empty() && !self.data_missing
    }

    /// `(final_name, bytes)` pairs in sequence order
    pub fn archive_entries(&self) -> Result<Vec<ArchiveEntry>, Issue> {
        if self.edited.is_empty() {
            return Err(Issue::EmptyBatch);
        }

        self.edited
            .iter()
            .map(|file| match &file.data {
                Some(data) => Ok(ArchiveEntry {
                    name: file.final_name.clone(),
                    data: data.clone(),
                }),
                None => Err(Issue::InternalDataMissing {
                    file: file.original_name.clone(),
                }),
            })
            .collect()
    }

    /// Pack the final files with `writer`
    pub fn build_archive(&self, writer: &dyn ArchiveWriter) -> lto_common::Result<Vec<u8>> {
        let entries = self
            .archive_entries()
            .map_err(|issue| lto_common::Error::Internal(issue.to_string()))?;
        writer.write_archive(&entries)
    }

    pub fn view(&self, archive_name: &str) -> SessionView {
        SessionView {
            session_id: self.id,
            created_at: self.created_at,
            uploads: self.uploads.clone(),
            sequenced: self.sequenced.clone(),
            edit: self.edit.clone(),
            files: self.edited.clone(),
            error_occurred: self.error_occurred,
            download_ready: self.download_ready(),
            archive_name: archive_name.to_string(),
            diagnostics: self.diagnostics(),
        }
    }
}
