use super::ToolContext;
use crate::diff::render_diff;
use crate::error::ToolError;
use crate::file_editor::{FileEditOutcome, plan_edits};
use crate::patch::EditSpec;
use serde::Deserialize;
use serde_json::{Value, json};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const NAME: &str = "fs_apply_text_edits";

#[derive(Deserialize, Debug, Clone)]
pub struct ApplyTextEditsArgs {
    pub path: String,
    pub edits: Vec<EditSpec>,
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,
}

fn default_create_if_missing() -> bool {
    true
}

pub fn schema() -> Value {
    let flags = json!({
        "case_sensitive": { "type": "boolean", "default": true },
        "loose_whitespace": { "type": "boolean", "default": true },
        "normalize_quotes": { "type": "boolean", "default": true }
    });
    let with_flags = |mut properties: Value| {
        if let (Some(target), Some(extra)) = (properties.as_object_mut(), flags.as_object()) {
            target.extend(extra.clone());
        }
        properties
    };

    json!({
        "type": "function",
        "name": NAME,
        "description": "Apply surgical text edits to a file (replace text, replace between markers, insert before/after). Create file if missing.",
        "parameters": {
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Target file path relative to book." },
                "create_if_missing": { "type": "boolean", "default": true },
                "edits": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "oneOf": [
                            {
                                "type": "object",
                                "properties": with_flags(json!({
                                    "type": { "type": "string", "enum": ["replace_text"] },
                                    "find": { "type": "string" },
                                    "replace": {
                                        "type": "string",
                                        "description": "Replacement text. With use_regex, $1 or ${name} insert capture groups and $$ is a literal $. Without use_regex it is inserted verbatim."
                                    },
                                    "use_regex": { "type": "boolean", "default": false },
                                    "occurrence": { "type": "integer", "minimum": 1 }
                                })),
                                "required": ["type", "find", "replace"]
                            },
                            {
                                "type": "object",
                                "properties": with_flags(json!({
                                    "type": { "type": "string", "enum": ["replace_between"] },
                                    "start_marker": { "type": "string" },
                                    "end_marker": { "type": "string" },
                                    "replacement": { "type": "string" },
                                    "include_markers": { "type": "boolean", "default": false },
                                    "occurrence": { "type": "integer", "minimum": 1 }
                                })),
                                "required": ["type", "start_marker", "end_marker", "replacement"]
                            },
                            {
                                "type": "object",
                                "properties": with_flags(json!({
                                    "type": { "type": "string", "enum": ["insert_before", "insert_after"] },
                                    "anchor": { "type": "string" },
                                    "insert": { "type": "string" },
                                    "occurrence": { "type": "integer", "minimum": 1 }
                                })),
                                "required": ["type", "anchor", "insert"]
                            }
                        ]
                    }
                }
            },
            "required": ["path", "edits"]
        }
    })
}

pub fn execute(args: &ApplyTextEditsArgs, ctx: &ToolContext) -> Result<FileEditOutcome, ToolError> {
    let plan = plan_edits(ctx.book_root, &args.path, &args.edits)?;

    if ctx.backup_before_edit && plan.existed {
        backup(&plan.path);
    }
    if ctx.debug_tool_calls {
        eprintln!("{}", render_diff(&plan.original, &plan.updated));
    }

    Ok(plan.commit(args.create_if_missing)?)
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".back");
    PathBuf::from(name)
}

/// Best effort: a failed backup never blocks the edit. An existing symlink
/// at the backup path is never written through, since it may point outside
/// the book.
fn backup(path: &Path) {
    let target = backup_path(path);
    if let Ok(metadata) = fs::symlink_metadata(&target) {
        if metadata.file_type().is_symlink() {
            warn!(
                "Not backing up '{}': '{}' is a symlink",
                path.display(),
                target.display()
            );
            return;
        }
    }
    match fs::copy(path, &target) {
        Ok(_) => debug!("Backed up '{}' to '{}'", path.display(), target.display()),
        Err(e) => warn!("Could not back up '{}': {e}", path.display()),
    }
}

#[cfg(test)]
#[path = "apply_text_edits_tests.rs"]
mod tests;
