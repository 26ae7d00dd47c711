//! # Tools
//!
//! The closed set of local operations the model may invoke. Dispatch is by
//! [`ToolKind`]: a name that does not map to a variant is an
//! [`ToolError::UnknownTool`], never a panic.

use crate::error::ToolError;
use crate::file_editor::FileEditOutcome;
use crate::file_reader::ReadOutcome;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

pub mod apply_text_edits;
pub mod read_text;

/// Everything a tool needs from the surrounding request.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    pub book_root: &'a Path,
    pub backup_before_edit: bool,
    pub debug_tool_calls: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    ReadText,
    ApplyTextEdits,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::ReadText, ToolKind::ApplyTextEdits];

    pub fn from_name(name: &str) -> Result<Self, ToolError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::ReadText => read_text::NAME,
            ToolKind::ApplyTextEdits => apply_text_edits::NAME,
        }
    }

    /// Function declaration in the flat Responses-API shape.
    pub fn schema(&self) -> Value {
        match self {
            ToolKind::ReadText => read_text::schema(),
            ToolKind::ApplyTextEdits => apply_text_edits::schema(),
        }
    }

    pub fn execute(&self, arguments: &str, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        match self {
            ToolKind::ReadText => {
                let args = parse_arguments(self.name(), arguments)?;
                read_text::execute(&args, ctx).map(ToolOutput::Read)
            }
            ToolKind::ApplyTextEdits => {
                let args = parse_arguments(self.name(), arguments)?;
                apply_text_edits::execute(&args, ctx).map(ToolOutput::Edit)
            }
        }
    }
}

/// The successful result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    Read(ReadOutcome),
    Edit(FileEditOutcome),
}

impl ToolOutput {
    pub fn to_json(&self) -> Result<Value, ToolError> {
        let serialized = match self {
            ToolOutput::Read(outcome) => serde_json::to_value(outcome),
            ToolOutput::Edit(outcome) => serde_json::to_value(outcome),
        };
        serialized.map_err(ToolError::Output)
    }
}

fn parse_arguments<T: DeserializeOwned>(
    tool: &'static str,
    arguments: &str,
) -> Result<T, ToolError> {
    serde_json::from_str(arguments).map_err(|source| ToolError::InvalidArguments { tool, source })
}
