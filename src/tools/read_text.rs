use super::ToolContext;
use crate::error::ToolError;
use crate::file_reader::{ReadOutcome, read_text};
use serde::Deserialize;
use serde_json::{Value, json};

pub const NAME: &str = "fs_read_text";

#[derive(Deserialize, Debug, Clone)]
pub struct ReadTextArgs {
    pub path: String,
}

pub fn schema() -> Value {
    json!({
        "type": "function",
        "name": NAME,
        "description": "Read a UTF-8 text file within the current book. Use before editing to get exact anchors.",
        "parameters": {
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Relative path within the book (e.g., chapters/chapter-1.md)."
                }
            },
            "required": ["path"]
        }
    })
}

pub fn execute(args: &ReadTextArgs, ctx: &ToolContext) -> Result<ReadOutcome, ToolError> {
    Ok(read_text(ctx.book_root, &args.path)?)
}
