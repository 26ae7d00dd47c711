pub mod activity;
pub mod agent;
pub mod anchor;
pub mod cli;
pub mod client;
pub mod config;
pub mod diff;
pub mod edit_ops;
pub mod error;
pub mod file_editor;
pub mod file_reader;
pub mod patch;
pub mod permissions;
pub mod response;
pub mod tool_collection;
pub mod tools;
pub mod transcript;

pub use activity::{ActivityLog, ActivityRegistry};
pub use agent::{Agent, AgentReply};
pub use client::{ModelClient, ModelRequest, ReplayClient};
pub use config::Config;
pub use error::{AgentError, EditError, ToolError};
pub use file_editor::{FileEditOutcome, apply_edits};
pub use patch::EditSpec;
pub use tool_collection::ToolCollection;
