//! Archive assembly
//!
//! The coordinator hands `(name, bytes)` pairs to an [`ArchiveWriter`] and
//! gets one container back. [`ZipArchiveWriter`] is the production writer:
//! flat member names, Deflate, and a fixed member timestamp so the same
//! entries always produce the same bytes.

use axum::body::Bytes;
use lto_common::range_edit::is_flat_name;
use lto_common::{Error, Result};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// One archive member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Bytes,
}

/// Packs named payloads into a single archive blob
pub trait ArchiveWriter: Send + Sync {
    fn write_archive(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>>;
}

/// Zip archive writer
#[derive(Debug, Clone, Copy)]
pub struct ZipArchiveWriter {
    compression: CompressionMethod,
}

impl Default for ZipArchiveWriter {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::Deflated,
        }
    }
}

impl ZipArchiveWriter {
    /// Writer storing members uncompressed
    pub fn stored() -> Self {
        Self {
            compression: CompressionMethod::Stored,
        }
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn write_archive(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
        let entries = last_write_wins(entries);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(self.compression)
            .last_modified_time(DateTime::default());

        for entry in &entries {
            if !is_flat_name(&entry.name) {
                return Err(Error::Archive(format!(
                    "Refusing non-flat member name {:?}",
                    entry.name
                )));
            }
            zip.start_file(entry.name.as_str(), options)
                .map_err(|e| Error::Archive(format!("{}: {}", entry.name, e)))?;
            zip.write_all(&entry.data)?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| Error::Archive(e.to_string()))?;
        let bytes = cursor.into_inner();

        tracing::info!(
            members = entries.len(),
            size_bytes = bytes.len(),
            "Archive written"
        );

        Ok(bytes)
    }
}

/// Drop earlier entries whose name appears again later
///
/// Members keep the relative order of their last occurrence.
pub fn last_write_wins(entries: &[ArchiveEntry]) -> Vec<&ArchiveEntry> {
    let mut seen = HashSet::new();
    let mut kept: Vec<&ArchiveEntry> = entries
        .iter()
        .rev()
        .filter(|entry| seen.insert(entry.name.as_str()))
        .collect();
    kept.reverse();

    if kept.len() < entries.len() {
        tracing::warn!(
            dropped = entries.len() - kept.len(),
            "Duplicate archive member names; keeping the last of each"
        );
    }

    kept
}
