//! # Agent
//!
//! The tool-call loop. One authoring request sends the prompt, then keeps
//! executing whatever tools the model asks for and resubmitting the growing
//! transcript until a response arrives with no tool calls. A round cap stops
//! runaway ping-pong; the capped response is returned as a best effort.

use crate::activity::ActivityLog;
use crate::client::{ModelClient, ModelRequest};
use crate::config::Config;
use crate::error::AgentError;
use crate::response::{ModelResponse, ToolCall};
use crate::tool_collection::ToolCollection;
use crate::transcript::Transcript;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// The final state of one authoring request.
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub response: ModelResponse,
    pub transcript: Transcript,
    /// Number of requests sent to the model, including the first.
    pub model_requests: usize,
    /// Number of rounds in which tools were executed.
    pub tool_rounds: usize,
    /// True if the loop stopped at the round cap with tool calls pending.
    pub capped: bool,
}

impl AgentReply {
    pub fn text(&self) -> String {
        self.response.text()
    }

    /// The final text, or [`AgentError::EmptyResult`] if there is none.
    pub fn into_text(self) -> Result<String, AgentError> {
        let text = self.text();
        if text.trim().is_empty() {
            return Err(AgentError::EmptyResult);
        }
        Ok(text)
    }
}

enum LoopState {
    AwaitingResponse,
    HasToolCalls {
        response: ModelResponse,
        calls: Vec<ToolCall>,
    },
    Resolved {
        response: ModelResponse,
        capped: bool,
    },
}

pub struct Agent {
    client: Arc<dyn ModelClient>,
    tools: ToolCollection,
    model: String,
    instructions: String,
    max_tool_rounds: usize,
    extra_tools: Vec<Value>,
}

impl Agent {
    pub fn new(client: Arc<dyn ModelClient>, book_root: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            client,
            tools: ToolCollection::new(book_root, config),
            model: config.model.clone(),
            instructions: config.instructions.clone(),
            max_tool_rounds: config.max_tool_rounds,
            extra_tools: Vec::new(),
        }
    }

    /// Adds tool declarations the model can use server side (a file search,
    /// for instance). They are forwarded as is and never dispatched locally.
    pub fn with_extra_tools(mut self, extra_tools: Vec<Value>) -> Self {
        self.extra_tools = extra_tools;
        self
    }

    pub fn tools(&self) -> &ToolCollection {
        &self.tools
    }

    /// Runs one authoring request to completion.
    pub async fn run(&self, prompt: &str, activity: &mut ActivityLog) -> Result<AgentReply, AgentError> {
        let mut transcript = Transcript::with_user_input(prompt);
        self.resolve(&mut transcript, activity).await
    }

    /// Like [`Agent::run`], but only returns the final text.
    pub async fn ask(&self, prompt: &str, activity: &mut ActivityLog) -> Result<String, AgentError> {
        self.run(prompt, activity).await?.into_text()
    }

    /// Drives the loop over an existing transcript.
    pub async fn resolve(
        &self,
        transcript: &mut Transcript,
        activity: &mut ActivityLog,
    ) -> Result<AgentReply, AgentError> {
        let mut model_requests = 0;
        let mut tool_rounds = 0;
        let mut state = LoopState::AwaitingResponse;

        loop {
            state = match state {
                LoopState::AwaitingResponse => {
                    let response = self.client.create_response(&self.request(transcript)).await?;
                    model_requests += 1;
                    transcript.extend_model_output(response.output_items());
                    let calls = response.tool_calls();
                    if calls.is_empty() {
                        LoopState::Resolved {
                            response,
                            capped: false,
                        }
                    } else {
                        LoopState::HasToolCalls { response, calls }
                    }
                }
                LoopState::HasToolCalls { response, calls } => {
                    if tool_rounds >= self.max_tool_rounds {
                        info!(
                            "Stopping after {tool_rounds} tool round(s); {} call(s) left unanswered",
                            calls.len()
                        );
                        LoopState::Resolved {
                            response,
                            capped: true,
                        }
                    } else {
                        tool_rounds += 1;
                        debug!(
                            "Round {tool_rounds}: {} tool call(s): {}",
                            calls.len(),
                            calls
                                .iter()
                                .map(|call| call.name.as_str())
                                .collect::<Vec<_>>()
                                .join(", ")
                        );

                        for call in &calls {
                            transcript.push(self.tools.execute_tool_call(call, activity));
                        }
                        LoopState::AwaitingResponse
                    }
                }
                LoopState::Resolved { response, capped } => {
                    activity.observe_final_response(&response);
                    return Ok(AgentReply {
                        response,
                        transcript: transcript.clone(),
                        model_requests,
                        tool_rounds,
                        capped,
                    });
                }
            };
        }
    }

    fn request(&self, transcript: &Transcript) -> ModelRequest {
        let mut tools = self.tools.get_all_schemas();
        tools.extend(self.extra_tools.iter().cloned());
        ModelRequest {
            model: self.model.clone(),
            instructions: self.instructions.clone(),
            input: transcript.to_input(),
            tools,
        }
    }
}
