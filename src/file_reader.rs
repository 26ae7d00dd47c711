use crate::error::EditError;
use crate::permissions::{resolve_within_root, serialize_lossy};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of `fs_read_text`. A missing file is reported, not raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadOutcome {
    #[serde(serialize_with = "serialize_lossy")]
    pub path: PathBuf,
    pub exists: bool,
    pub content: String,
}

/// Reads a UTF-8 text file inside the book.
pub fn read_text(root: &Path, relative_path: &str) -> Result<ReadOutcome, EditError> {
    let path = resolve_within_root(root, relative_path)?;
    if !path.exists() {
        return Ok(ReadOutcome {
            path,
            exists: false,
            content: String::new(),
        });
    }

    let content = fs::read_to_string(&path).map_err(|source| EditError::io(&path, source))?;
    Ok(ReadOutcome {
        path,
        exists: true,
        content,
    })
}
