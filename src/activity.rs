//! # Activity
//!
//! A per-request record of what the model did: which tools it called, how
//! many edits landed, and which file was last changed. The log is owned by
//! the caller and handed to the loop explicitly. [`ActivityRegistry`] keeps
//! the most recent log per book for callers that want memory across
//! requests.

use crate::response::ModelResponse;
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{Formatter, Serializer};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLog {
    entries: Vec<String>,
    edit_calls: usize,
    total_changes: usize,
    last_edited_file: Option<PathBuf>,
    preview_chars: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_preview_chars(DEFAULT_PREVIEW_CHARS)
    }
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preview_chars(preview_chars: usize) -> Self {
        Self {
            entries: Vec::new(),
            edit_calls: 0,
            total_changes: 0,
            last_edited_file: None,
            preview_chars,
        }
    }

    pub fn record_tool_call(&mut self, name: &str, arguments: &str) {
        // Arguments that are not JSON are shown as an empty object.
        let encoded = serde_json::from_str::<Value>(arguments)
            .map(|value| spaced_json(&value))
            .unwrap_or_else(|_| "{}".to_string());
        let preview = self.preview(&encoded);
        self.entries.push(format!("tool: {name} args={preview}"));
    }

    /// Counts one successful apply-edits call. `relative_path` becomes the
    /// last edited file only when the call changed something.
    pub fn record_edit(&mut self, relative_path: PathBuf, changes: usize) {
        self.edit_calls += 1;
        self.total_changes += changes;
        if changes > 0 {
            self.last_edited_file = Some(relative_path);
        }
    }

    /// Folds what the final response reveals into the log: its reasoning
    /// summary goes first, then file searches and calls it still carries,
    /// then the edit totals.
    pub fn observe_final_response(&mut self, response: &ModelResponse) {
        if let Some(summary) = response.reasoning_summary() {
            self.entries.insert(0, format!("reasoning: {summary}"));
        }

        for item in response.output_items() {
            match item.get("type").and_then(Value::as_str) {
                Some("file_search_call") => {
                    let queries: Vec<String> = item
                        .get("queries")
                        .and_then(Value::as_array)
                        .map(|queries| queries.iter().map(display_value).collect())
                        .unwrap_or_default();
                    if !queries.is_empty() {
                        self.entries.push(format!("file_search: {}", queries.join(", ")));
                    }
                }
                Some("function_call" | "tool_use") => {
                    let name = item.get("name").map(display_value).unwrap_or_default();
                    let arguments = match item.get("arguments") {
                        Some(Value::String(raw)) => raw.clone(),
                        Some(Value::Null) | None => "{}".to_string(),
                        Some(other) => spaced_json(other),
                    };
                    let preview = self.preview(&arguments);
                    self.entries.push(format!("model_call: {name} args={preview}"));
                }
                _ => {}
            }
        }

        if self.edit_calls > 0 {
            self.entries.push(format!(
                "applied_edits: {} call(s), changes={}",
                self.edit_calls, self.total_changes
            ));
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn edit_calls(&self) -> usize {
        self.edit_calls
    }

    pub fn total_changes(&self) -> usize {
        self.total_changes
    }

    pub fn last_edited_file(&self) -> Option<&Path> {
        self.last_edited_file.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the entries as a markdown bullet list.
    pub fn summary_markdown(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("- {entry}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn preview(&self, text: &str) -> String {
        if text.chars().count() > self.preview_chars {
            let head: String = text.chars().take(self.preview_chars).collect();
            format!("{head}...")
        } else {
            text.to_string()
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Single-line JSON with a space after every `,` and `:`, the layout
/// previews have always used.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

fn spaced_json(value: &Value) -> String {
    let mut serializer = Serializer::with_formatter(Vec::new(), SpacedFormatter);
    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8_lossy(&serializer.into_inner()).into_owned(),
        Err(_) => value.to_string(),
    }
}

/// The latest activity per book, keyed by book root.
#[derive(Debug, Default)]
pub struct ActivityRegistry {
    by_book: HashMap<PathBuf, ActivityLog>,
}

impl ActivityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `log` for `book_root`. The last edited file survives requests
    /// that edited nothing.
    pub fn record(&mut self, book_root: &Path, mut log: ActivityLog) {
        if log.last_edited_file.is_none() {
            log.last_edited_file = self
                .by_book
                .get(book_root)
                .and_then(|previous| previous.last_edited_file.clone());
        }
        self.by_book.insert(book_root.to_path_buf(), log);
    }

    pub fn last_activity(&self, book_root: &Path) -> Option<&ActivityLog> {
        self.by_book.get(book_root)
    }

    pub fn last_edited_file(&self, book_root: &Path) -> Option<&Path> {
        self.by_book
            .get(book_root)
            .and_then(ActivityLog::last_edited_file)
    }

    pub fn clear(&mut self, book_root: &Path) {
        self.by_book.remove(book_root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_calls_are_previewed() {
        let mut log = ActivityLog::with_preview_chars(10);
        log.record_tool_call("fs_read_text", r#"{ "path" : "a.md" }"#);
        log.record_tool_call("fs_read_text", "{}");
        log.record_tool_call("fs_read_text", "{\"path\":");

        assert_eq!(
            log.entries(),
            &[
                "tool: fs_read_text args={\"path\": \"...".to_string(),
                "tool: fs_read_text args={}".to_string(),
                "tool: fs_read_text args={}".to_string(),
            ]
        );
    }

    #[test]
    fn test_only_changing_edits_set_last_file() {
        let mut log = ActivityLog::new();
        log.record_edit(PathBuf::from("chapters/chapter-1.md"), 2);
        log.record_edit(PathBuf::from("chapters/chapter-2.md"), 0);

        assert_eq!(log.edit_calls(), 2);
        assert_eq!(log.total_changes(), 2);
        assert_eq!(log.last_edited_file(), Some(Path::new("chapters/chapter-1.md")));
    }

    #[test]
    fn test_final_response_is_summarized() {
        let mut log = ActivityLog::new();
        log.record_tool_call("fs_apply_text_edits", r#"{"path":"a.md","edits":[]}"#);
        log.record_edit(PathBuf::from("a.md"), 3);

        let response = ModelResponse::new(json!({
            "reasoning": { "summary": "  Tightened the opening.  " },
            "output": [
                { "type": "file_search_call", "queries": ["villain motive", "act two"] },
                { "type": "file_search_call", "queries": [] },
                { "type": "function_call", "name": "lookup", "arguments": { "q": 1 } },
                { "type": "message", "content": [] }
            ]
        }));
        log.observe_final_response(&response);

        assert_eq!(
            log.summary_markdown(),
            [
                "- reasoning: Tightened the opening.",
                "- tool: fs_apply_text_edits args={\"path\": \"a.md\", \"edits\": []}",
                "- file_search: villain motive, act two",
                "- model_call: lookup args={\"q\": 1}",
                "- applied_edits: 1 call(s), changes=3",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_nested_arguments_keep_spacing() {
        let mut log = ActivityLog::new();
        log.record_tool_call(
            "fs_apply_text_edits",
            r#"{"edits":[{"type":"replace_text","find":"a, b"},{"occurrence":2}]}"#,
        );

        assert_eq!(
            log.entries()[0],
            r#"tool: fs_apply_text_edits args={"edits": [{"type": "replace_text", "find": "a, b"}, {"occurrence": 2}]}"#
        );
    }

    #[test]
    fn test_empty_log_renders_nothing() {
        let mut log = ActivityLog::new();
        log.observe_final_response(&ModelResponse::default());
        assert!(log.is_empty());
        assert_eq!(log.summary_markdown(), "");
    }

    #[test]
    fn test_registry_keeps_latest_per_book() {
        let mut registry = ActivityRegistry::new();
        let book = Path::new("/books/saga");

        let mut first = ActivityLog::new();
        first.record_edit(PathBuf::from("chapters/one.md"), 1);
        registry.record(book, first);

        let mut second = ActivityLog::new();
        second.record_tool_call("fs_read_text", "{}");
        registry.record(book, second);

        assert_eq!(registry.last_activity(book).unwrap().entries().len(), 1);
        assert_eq!(
            registry.last_edited_file(book),
            Some(Path::new("chapters/one.md"))
        );
        assert_eq!(registry.last_edited_file(Path::new("/books/other")), None);

        registry.clear(book);
        assert!(registry.last_activity(book).is_none());
    }
}
