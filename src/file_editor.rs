//! # File Editor
//!
//! The batch applicator behind the `fs_apply_text_edits` tool. Its
//! responsibilities are:
//!
//! 1.  **Path Validation**: The requested path is resolved against the book
//!     root and rejected if it leaves it (see [`crate::permissions`]).
//!
//! 2.  **Planning**: The current file is read once (a missing file counts as
//!     empty), its line-ending convention is detected, and every [`EditSpec`]
//!     is applied in order to an in-memory buffer. Later edits see the output
//!     of earlier ones. Nothing touches the disk in this phase.
//!
//! 3.  **Committing**: The final buffer is normalized to a single line-ending
//!     convention and written atomically, replacing the file in full.

use crate::error::EditError;
use crate::patch::EditSpec;
use crate::permissions::{resolve_within_root, serialize_lossy};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Number of characters of the final content echoed back in an outcome.
pub const PREVIEW_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    CrLf,
    Cr,
    Lf,
}

impl LineEnding {
    /// Detects the convention of existing content. `\r\n` wins over a lone
    /// `\r`, which wins over `\n`.
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            LineEnding::CrLf
        } else if text.contains('\r') {
            LineEnding::Cr
        } else {
            LineEnding::Lf
        }
    }

    /// The convention used for files that do not exist yet.
    pub fn platform() -> Self {
        if cfg!(windows) {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::CrLf => "\r\n",
            LineEnding::Cr => "\r",
            LineEnding::Lf => "\n",
        }
    }

    /// Rewrites every line break in `text`, whatever its style, to this one.
    pub fn normalize(&self, text: &str) -> String {
        let unified = text.replace("\r\n", "\n").replace('\r', "\n");
        match self {
            LineEnding::Lf => unified,
            other => unified.replace('\n', other.as_str()),
        }
    }
}

/// What an apply-edits call reports back, both to the model and to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEditOutcome {
    #[serde(rename = "path", serialize_with = "serialize_lossy")]
    pub absolute_path: PathBuf,
    pub created: bool,
    #[serde(rename = "changes")]
    pub total_changes: usize,
    pub preview: String,
}

/// A fully computed, not yet written, edit batch.
#[derive(Debug, Clone)]
pub struct EditPlan {
    pub path: PathBuf,
    pub existed: bool,
    pub original: String,
    pub updated: String,
    pub line_ending: LineEnding,
    pub total_changes: usize,
}

/// Reads the target and applies `edits` in order to an in-memory buffer.
pub fn plan_edits(
    root: &Path,
    relative_path: &str,
    edits: &[EditSpec],
) -> Result<EditPlan, EditError> {
    let path = resolve_within_root(root, relative_path)?;
    let existed = path.exists();
    let original = if existed {
        fs::read_to_string(&path).map_err(|source| EditError::io(&path, source))?
    } else {
        String::new()
    };
    let line_ending = if existed {
        LineEnding::detect(&original)
    } else {
        LineEnding::platform()
    };

    let mut text = original.clone();
    let mut total_changes = 0;
    for (index, edit) in edits.iter().enumerate() {
        if matches!(edit, EditSpec::Unknown) {
            debug!("Skipping unknown edit #{index} for '{relative_path}'");
            continue;
        }
        let result = edit.apply(&text)?;
        debug!(
            "Edit #{index} ({}) on '{relative_path}': {} change(s)",
            edit.kind(),
            result.changes_applied
        );
        total_changes += result.changes_applied;
        text = result.content;
    }

    Ok(EditPlan {
        updated: line_ending.normalize(&text),
        path,
        existed,
        original,
        line_ending,
        total_changes,
    })
}

impl EditPlan {
    pub fn preview(&self) -> String {
        self.updated.chars().take(PREVIEW_CHARS).collect()
    }

    /// Writes the planned content. A file that did not exist is only created
    /// when `create_if_missing` is set; otherwise the outcome is returned as a
    /// dry run with `created = false`.
    pub fn commit(self, create_if_missing: bool) -> Result<FileEditOutcome, EditError> {
        let preview = self.preview();

        if !self.existed && !create_if_missing {
            debug!(
                "Not creating '{}': file is missing and create_if_missing is false",
                self.path.display()
            );
            return Ok(FileEditOutcome {
                absolute_path: self.path,
                created: false,
                total_changes: self.total_changes,
                preview,
            });
        }

        write_atomically(&self.path, &self.updated)?;
        info!(
            "Wrote '{}' ({} change(s){})",
            self.path.display(),
            self.total_changes,
            if self.existed { "" } else { ", created" }
        );

        Ok(FileEditOutcome {
            absolute_path: self.path,
            created: !self.existed,
            total_changes: self.total_changes,
            preview,
        })
    }
}

/// Applies an ordered edit batch to one file under `root`.
pub fn apply_edits(
    root: &Path,
    relative_path: &str,
    edits: &[EditSpec],
    create_if_missing: bool,
) -> Result<FileEditOutcome, EditError> {
    plan_edits(root, relative_path, edits)?.commit(create_if_missing)
}

/// Writes through a temporary sibling file that is renamed over the target,
/// so readers never observe a half-written chapter.
fn write_atomically(path: &Path, content: &str) -> Result<(), EditError> {
    let parent = path.parent().ok_or_else(|| {
        EditError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent"),
        )
    })?;
    fs::create_dir_all(parent).map_err(|source| EditError::io(parent, source))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|source| EditError::io(parent, source))?;
    temp.write_all(content.as_bytes())
        .map_err(|source| EditError::io(path, source))?;

    let permissions = match fs::metadata(path) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(_) => new_file_permissions(),
    };
    if let Some(permissions) = permissions {
        temp.as_file()
            .set_permissions(permissions)
            .map_err(|source| EditError::io(path, source))?;
    }

    temp.persist(path)
        .map_err(|err| EditError::io(path, err.error))?;
    Ok(())
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

#[cfg(test)]
#[path = "file_editor_tests.rs"]
mod tests;
