//! # Model Responses
//!
//! A thin wrapper over the raw JSON a model returns. Two response shapes can
//! carry tool calls:
//!
//! - inline `output` items of type `function_call` / `tool_use`;
//! - a `required_action` of type `submit_tool_outputs` bundling several calls.
//!
//! Both normalize to [`ToolCall`].

use serde_json::Value;
use std::collections::HashSet;

/// A request from the model to run a named local operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub name: String,
    /// JSON-encoded argument object, as sent by the model.
    pub arguments: String,
    /// Opaque token echoed back unchanged in the matching tool output.
    pub call_id: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    raw: Value,
}

impl ModelResponse {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn output_items(&self) -> &[Value] {
        self.raw
            .get("output")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn reasoning_summary(&self) -> Option<&str> {
        self.raw
            .get("reasoning")
            .and_then(|reasoning| reasoning.get("summary"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|summary| !summary.is_empty())
    }

    /// Every tool call requested by this response, inline items first.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        let mut calls: Vec<ToolCall> = self.output_items().iter().filter_map(inline_call).collect();
        calls.extend(self.required_action_calls());
        calls
    }

    fn required_action_calls(&self) -> Vec<ToolCall> {
        let Some(action) = self.raw.get("required_action") else {
            return Vec::new();
        };
        if action.get("type").and_then(Value::as_str) != Some("submit_tool_outputs") {
            return Vec::new();
        }

        let pending = action
            .get("submit_tool_outputs")
            .and_then(|submit| present(submit.get("tool_calls")))
            .or_else(|| present(action.get("tool_calls")))
            .and_then(Value::as_array);

        pending
            .map(|calls| calls.iter().filter_map(pending_call).collect())
            .unwrap_or_default()
    }

    /// The text the model produced for the user.
    ///
    /// A top-level `output_text` wins. Otherwise `output_text` content parts
    /// are collected, falling back to legacy `text.value` parts. Duplicate
    /// chunks are dropped, keeping the first occurrence.
    pub fn text(&self) -> String {
        if let Some(text) = self.raw.get("output_text").and_then(Value::as_str) {
            if !text.is_empty() {
                return text.to_string();
            }
        }

        let mut output_text_chunks = Vec::new();
        let mut text_value_chunks = Vec::new();
        for item in self.output_items() {
            let Some(parts) = item.get("content").and_then(Value::as_array) else {
                continue;
            };
            for part in parts {
                match part.get("type").and_then(Value::as_str) {
                    Some("output_text") => {
                        if let Some(text) = part.get("text").and_then(Value::as_str) {
                            output_text_chunks.push(text);
                        }
                    }
                    Some("text") => {
                        if let Some(text) = part
                            .get("text")
                            .and_then(|inner| inner.get("value"))
                            .and_then(Value::as_str)
                        {
                            text_value_chunks.push(text);
                        }
                    }
                    _ => {}
                }
            }
        }

        let chunks = if output_text_chunks.is_empty() {
            text_value_chunks
        } else {
            output_text_chunks
        };
        dedup_preserve_order(chunks).join("\n")
    }
}

fn inline_call(item: &Value) -> Option<ToolCall> {
    let kind = item.get("type").and_then(Value::as_str)?;
    if !matches!(kind, "function_call" | "tool_use") {
        return None;
    }
    let function = item.get("function");
    let nested = |key: &str| function.and_then(|f| f.get(key));

    let name = non_empty_str(item.get("name")).or_else(|| non_empty_str(nested("name")))?;
    let call_id = non_empty_str(item.get("call_id"))
        .or_else(|| non_empty_str(item.get("id")))
        .or_else(|| non_empty_str(nested("id")))?;
    let arguments = present(item.get("arguments"))
        .or_else(|| present(nested("arguments")))
        .or_else(|| present(item.get("input")));

    Some(ToolCall {
        name: name.to_string(),
        arguments: encode_arguments(arguments),
        call_id: call_id.to_string(),
    })
}

fn pending_call(call: &Value) -> Option<ToolCall> {
    let function = call.get("function");
    let nested = |key: &str| function.and_then(|f| f.get(key));

    let name = non_empty_str(nested("name")).or_else(|| non_empty_str(call.get("name")))?;
    let call_id = non_empty_str(call.get("id"))
        .or_else(|| non_empty_str(call.get("tool_call_id")))
        .or_else(|| non_empty_str(call.get("call_id")))?;
    let arguments = present(nested("arguments")).or_else(|| present(call.get("arguments")));

    Some(ToolCall {
        name: name.to_string(),
        arguments: encode_arguments(arguments),
        call_id: call_id.to_string(),
    })
}

/// Treats `null` and `""` like a missing key.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    present(value).and_then(Value::as_str)
}

fn encode_arguments(arguments: Option<&Value>) -> String {
    match arguments {
        Some(Value::String(encoded)) => encoded.clone(),
        Some(other) => other.to_string(),
        None => "{}".to_string(),
    }
}

fn dedup_preserve_order(chunks: Vec<&str>) -> Vec<&str> {
    let mut seen = HashSet::new();
    chunks
        .into_iter()
        .filter(|chunk| {
            let trimmed = chunk.trim();
            !trimmed.is_empty() && seen.insert(trimmed)
        })
        .collect()
}
