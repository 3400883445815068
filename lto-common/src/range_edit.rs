//! Positional range edits with highlighted previews
//!
//! One [`EditOp`] is applied to every sequenced name. Positions are 1-based
//! and count characters, not bytes. Each name is checked on its own: the same
//! operation may fit one name and fall outside a shorter one. A name the
//! operation does not fit keeps its initial form.
//!
//! The preview is computed from the same index arithmetic as the edit and is
//! for display only.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::diagnostics::Issue;
use crate::{Error, Result};

/// The single text transform applied to all names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum EditOp {
    /// Remove `count` characters starting at `start`
    Remove { start: usize, count: usize },
    /// Insert `text` before `position`
    Add {
        position: usize,
        #[serde(default)]
        text: String,
    },
    /// Replace `count` characters starting at `start` with `text`
    Replace {
        start: usize,
        count: usize,
        #[serde(default)]
        text: String,
    },
}

impl Default for EditOp {
    /// Initial form state: remove nothing
    fn default() -> Self {
        EditOp::Remove { start: 1, count: 0 }
    }
}

/// Operation variant without parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    Remove,
    Add,
    Replace,
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditKind::Remove => write!(f, "remove range"),
            EditKind::Add => write!(f, "add position"),
            EditKind::Replace => write!(f, "replace range"),
        }
    }
}

impl EditOp {
    pub fn kind(&self) -> EditKind {
        match self {
            EditOp::Remove { .. } => EditKind::Remove,
            EditOp::Add { .. } => EditKind::Add,
            EditOp::Replace { .. } => EditKind::Replace,
        }
    }

    /// Check the form minimums (positions start at 1)
    pub fn validate(&self) -> Result<()> {
        let (field, value) = match self {
            EditOp::Remove { start, .. } | EditOp::Replace { start, .. } => ("start", *start),
            EditOp::Add { position, .. } => ("position", *position),
        };
        if value < 1 {
            return Err(Error::InvalidInput(format!(
                "{} must be at least 1, got {}",
                field, value
            )));
        }
        Ok(())
    }
}

/// One piece of a preview
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Segment {
    /// Unchanged text
    Kept(String),
    /// Text dropped by a remove
    Removed(String),
    /// Text dropped by a replace (struck through)
    Replaced(String),
    /// Text added by an add or replace
    Inserted(String),
    /// Insertion point marker for an add
    Caret,
}

/// Annotated view of what an edit does to one name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub segments: Vec<Segment>,
}

impl Preview {
    /// Name shown as-is, nothing highlighted
    pub fn plain(name: &str) -> Self {
        Self {
            segments: vec![Segment::Kept(name.to_string())],
        }
    }

    /// Render as HTML; all filename text is escaped
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Kept(text) => html.push_str(&escape_html(text)),
                Segment::Removed(text) => {
                    html.push_str("<span class=\"removed\">");
                    html.push_str(&escape_html(text));
                    html.push_str("</span>");
                }
                Segment::Replaced(text) => {
                    html.push_str("<span class=\"replaced\">");
                    html.push_str(&escape_html(text));
                    html.push_str("</span>");
                }
                Segment::Inserted(text) => {
                    html.push_str("<span class=\"inserted\">");
                    html.push_str(&escape_html(text));
                    html.push_str("</span>");
                }
                Segment::Caret => html.push_str("<span class=\"caret\">|</span>"),
            }
        }
        html
    }
}

impl fmt::Display for Preview {
    /// Plain-text form: `[-removed-]`, `{+inserted+}`, `|` for the caret
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Kept(text) => write!(f, "{}", text)?,
                Segment::Removed(text) | Segment::Replaced(text) => write!(f, "[-{}-]", text)?,
                Segment::Inserted(text) => write!(f, "{{+{}+}}", text)?,
                Segment::Caret => write!(f, "|")?,
            }
        }
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Outcome of applying an [`EditOp`] to one name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditResult {
    pub final_name: String,
    pub preview: Preview,
    pub valid: bool,
    pub issue: Option<Issue>,
}

impl EditResult {
    fn unchanged(name: &str) -> Self {
        Self {
            final_name: name.to_string(),
            preview: Preview::plain(name),
            valid: true,
            issue: None,
        }
    }

    fn invalid(name: &str, kind: EditKind) -> Self {
        Self {
            final_name: name.to_string(),
            preview: Preview::plain(name),
            valid: false,
            issue: Some(Issue::EditRangeInvalid {
                name: name.to_string(),
                operation: kind,
            }),
        }
    }

    fn not_flat(name: &str, kind: EditKind, result: String) -> Self {
        Self {
            final_name: name.to_string(),
            preview: Preview::plain(name),
            valid: false,
            issue: Some(Issue::EditNameInvalid {
                name: name.to_string(),
                operation: kind,
                result,
            }),
        }
    }
}

/// Usable as a flat archive member: non-empty, not `.` or `..`, no `/` or `\`
pub fn is_flat_name(name: &str) -> bool {
    !matches!(name, "" | "." | "..") && !name.contains(['/', '\\'])
}

/// 0-based `[start, end)` for a 1-based `start` and `count`, if it fits in `len`
fn span(start: usize, count: usize, len: usize) -> Option<(usize, usize)> {
    let begin = start.checked_sub(1)?;
    if begin >= len {
        return None;
    }
    let end = begin.checked_add(count)?;
    (end <= len).then_some((begin, end))
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}

/// Apply `op` to `name`
///
/// # Examples
/// ```
/// use lto_common::range_edit::{apply_edit, EditOp};
///
/// let result = apply_edit("Track_01_keyG_90bpm.wav", &EditOp::Remove { start: 6, count: 3 });
/// assert!(result.valid);
/// assert_eq!(result.final_name, "Track_keyG_90bpm.wav");
/// ```
///
/// A result that is empty or contains a path separator is rejected and the
/// name is kept, the same as an out-of-range edit.
pub fn apply_edit(name: &str, op: &EditOp) -> EditResult {
    let result = apply_in_range(name, op);
    if result.valid && !is_flat_name(&result.final_name) {
        return EditResult::not_flat(name, op.kind(), result.final_name);
    }
    result
}

fn apply_in_range(name: &str, op: &EditOp) -> EditResult {
    let chars: Vec<char> = name.chars().collect();
    let len = chars.len();

    match op {
        EditOp::Remove { count: 0, .. } => EditResult::unchanged(name),
        EditOp::Remove { start, count } => match span(*start, *count, len) {
            Some((begin, end)) => {
                let head = collect(&chars[..begin]);
                let removed = collect(&chars[begin..end]);
                let tail = collect(&chars[end..]);
                EditResult {
                    final_name: format!("{}{}", head, tail),
                    preview: Preview {
                        segments: vec![
                            Segment::Kept(head),
                            Segment::Removed(removed),
                            Segment::Kept(tail),
                        ],
                    },
                    valid: true,
                    issue: None,
                }
            }
            None => EditResult::invalid(name, EditKind::Remove),
        },
        EditOp::Add { text, .. } if text.is_empty() => EditResult::unchanged(name),
        EditOp::Add { position, text } => match position.checked_sub(1) {
            Some(at) if at <= len => {
                let head = collect(&chars[..at]);
                let tail = collect(&chars[at..]);
                EditResult {
                    final_name: format!("{}{}{}", head, text, tail),
                    preview: Preview {
                        segments: vec![
                            Segment::Kept(head),
                            Segment::Caret,
                            Segment::Inserted(text.clone()),
                            Segment::Kept(tail),
                        ],
                    },
                    valid: true,
                    issue: None,
                }
            }
            _ => EditResult::invalid(name, EditKind::Add),
        },
        EditOp::Replace { start, count, text } => match span(*start, *count, len) {
            Some((begin, end)) => {
                let head = collect(&chars[..begin]);
                let replaced = collect(&chars[begin..end]);
                let tail = collect(&chars[end..]);
                EditResult {
                    final_name: format!("{}{}{}", head, text, tail),
                    preview: Preview {
                        segments: vec![
                            Segment::Kept(head),
                            Segment::Replaced(replaced),
                            Segment::Inserted(text.clone()),
                            Segment::Kept(tail),
                        ],
                    },
                    valid: true,
                    issue: None,
                }
            }
            None => EditResult::invalid(name, EditKind::Replace),
        },
    }
}

/// Results for a whole batch of names
#[derive(Debug, Clone, Default)]
pub struct EditBatch {
    pub results: Vec<EditResult>,
    /// True when any name rejected the operation
    pub error_occurred: bool,
}

/// Apply `op` to each name independently
///
/// A name the operation does not fit never stops the others.
pub fn apply_edit_batch<'a, I>(names: I, op: &EditOp) -> EditBatch
where
    I: IntoIterator<Item = &'a str>,
{
    let results: Vec<EditResult> = names
        .into_iter()
        .map(|name| apply_edit(name, op))
        .collect();
    let error_occurred = results.iter().any(|r| !r.valid);

    if error_occurred {
        tracing::warn!(
            operation = ?op.kind(),
            invalid = results.iter().filter(|r| !r.valid).count(),
            "Edit did not fit every filename"
        );
    }

    EditBatch {
        results,
        error_occurred,
    }
}
