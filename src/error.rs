//! Error types shared by the edit engine, the tool dispatcher and the loop.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the edit engine itself.
///
/// A missing anchor is deliberately absent here: "nothing matched" is a
/// zero-change result, not an error.
#[derive(Error, Debug)]
pub enum EditError {
    #[error("Path '{path}' is outside of the book directory '{}'", root.display())]
    PathEscapesRoot { path: String, root: PathBuf },

    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EditError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures of a single tool call. These are reported back to the model as
/// an error payload and never abort the round.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("Could not encode tool output: {0}")]
    Output(#[source] serde_json::Error),
}

/// Failures visible to the caller of a whole authoring request.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Transport(#[from] anyhow::Error),

    #[error("The model finished without producing any text (empty result)")]
    EmptyResult,
}
