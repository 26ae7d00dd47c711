//! # Tool Collection
//!
//! The `ToolCollection` turns a model's [`ToolCall`] into exactly one
//! transcript item. Lookup, argument parsing and execution failures are all
//! captured as an `{"error": ...}` payload, so one bad call never stops the
//! rest of the round.

use crate::activity::ActivityLog;
use crate::config::Config;
use crate::error::ToolError;
use crate::permissions::relative_to_root;
use crate::response::ToolCall;
use crate::tools::{ToolContext, ToolKind, ToolOutput};
use crate::transcript::TranscriptItem;
use console::style;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tracing::debug;

const LOG_PREVIEW_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct ToolCollection {
    book_root: PathBuf,
    backup_before_edit: bool,
    debug_tool_calls: bool,
}

impl ToolCollection {
    pub fn new(book_root: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            book_root: book_root.into(),
            backup_before_edit: config.backup_before_edit,
            debug_tool_calls: config.debug_tool_calls,
        }
    }

    pub fn book_root(&self) -> &Path {
        &self.book_root
    }

    /// Gathers the schemas of every tool the model may call.
    pub fn get_all_schemas(&self) -> Vec<Value> {
        ToolKind::ALL.iter().map(ToolKind::schema).collect()
    }

    /// Executes a tool call and returns its output item. This always
    /// succeeds from the caller's point of view.
    pub fn execute_tool_call(&self, call: &ToolCall, activity: &mut ActivityLog) -> TranscriptItem {
        debug!(
            "Calling tool {} with args {}",
            call.name,
            preview(&call.arguments)
        );
        activity.record_tool_call(&call.name, &call.arguments);

        let result = self.dispatch(call).and_then(|output| {
            if let ToolOutput::Edit(outcome) = &output {
                let relative = relative_to_root(&self.book_root, &outcome.absolute_path)
                    .unwrap_or_else(|| outcome.absolute_path.clone());
                activity.record_edit(relative, outcome.total_changes);
            }
            output.to_json()
        });

        let payload = match result {
            Ok(value) => value,
            Err(e) => {
                let error_message = e.to_string();
                if self.debug_tool_calls {
                    eprintln!(
                        "{}",
                        style(format!("Error executing tool `{}`: {error_message}", call.name)).red()
                    );
                }
                json!({ "error": error_message })
            }
        };

        let output = payload.to_string();
        debug!("Tool {} -> {}", call.name, preview(&output));
        TranscriptItem::ToolOutput {
            call_id: call.call_id.clone(),
            output,
        }
    }

    fn dispatch(&self, call: &ToolCall) -> Result<ToolOutput, ToolError> {
        let kind = ToolKind::from_name(&call.name)?;
        let ctx = ToolContext {
            book_root: &self.book_root,
            backup_before_edit: self.backup_before_edit,
            debug_tool_calls: self.debug_tool_calls,
        };
        kind.execute(&call.arguments, &ctx)
    }
}

fn preview(text: &str) -> String {
    text.chars().take(LOG_PREVIEW_CHARS).collect()
}
