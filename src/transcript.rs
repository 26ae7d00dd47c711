//! # Transcript
//!
//! The ordered, append-only log of items exchanged with the model during one
//! authoring request. It lives only as long as that request.

use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptItem {
    /// The caller's prompt.
    UserInput(String),
    /// One output item of a model response, kept verbatim so the model sees
    /// its own earlier reasoning and calls on the next turn.
    ModelOutput(Value),
    /// The serialized result of one tool call, correlated by `call_id`.
    ToolOutput { call_id: String, output: String },
}

impl TranscriptItem {
    /// The item in the shape the model API expects as input.
    pub fn to_input(&self) -> Value {
        match self {
            TranscriptItem::UserInput(text) => json!({ "role": "user", "content": text }),
            TranscriptItem::ModelOutput(item) => item.clone(),
            TranscriptItem::ToolOutput { call_id, output } => json!({
                "type": "function_call_output",
                "call_id": call_id,
                "output": output,
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    items: Vec<TranscriptItem>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_input(prompt: impl Into<String>) -> Self {
        Self {
            items: vec![TranscriptItem::UserInput(prompt.into())],
        }
    }

    pub fn push(&mut self, item: TranscriptItem) {
        self.items.push(item);
    }

    pub fn extend_model_output(&mut self, output: &[Value]) {
        self.items
            .extend(output.iter().cloned().map(TranscriptItem::ModelOutput));
    }

    pub fn items(&self) -> &[TranscriptItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_input(&self) -> Vec<Value> {
        self.items.iter().map(TranscriptItem::to_input).collect()
    }

    /// All tool outputs in order, as `(call_id, output)` pairs.
    pub fn tool_outputs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().filter_map(|item| match item {
            TranscriptItem::ToolOutput { call_id, output } => {
                Some((call_id.as_str(), output.as_str()))
            }
            _ => None,
        })
    }
}
