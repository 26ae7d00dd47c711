use crate::response::ModelResponse;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tokio::sync::Mutex;

/// One request to the model: the whole transcript so far plus the tools it
/// may call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRequest {
    pub model: String,
    pub instructions: String,
    pub input: Vec<Value>,
    pub tools: Vec<Value>,
}

/// The transport to the language model. Implementations own networking,
/// auth and retries; the loop only needs one response per request.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn create_response(&self, request: &ModelRequest) -> Result<ModelResponse>;
}

/// Plays back recorded responses in order, repeating the last one once the
/// script runs out. Every request is kept for inspection.
pub struct ReplayClient {
    responses: Vec<Value>,
    state: Mutex<ReplayState>,
}

#[derive(Default)]
struct ReplayState {
    cursor: usize,
    requests: Vec<ModelRequest>,
}

impl ReplayClient {
    pub fn new(responses: Vec<Value>) -> Self {
        Self {
            responses,
            state: Mutex::new(ReplayState::default()),
        }
    }

    /// Loads a script file holding a JSON array of response objects.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay script {}", path.display()))?;
        let responses: Vec<Value> = serde_json::from_str(&raw)
            .with_context(|| format!("Replay script {} is not a JSON array", path.display()))?;
        Ok(Self::new(responses))
    }

    pub async fn requests(&self) -> Vec<ModelRequest> {
        self.state.lock().await.requests.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.state.lock().await.requests.len()
    }
}

#[async_trait]
impl ModelClient for ReplayClient {
    async fn create_response(&self, request: &ModelRequest) -> Result<ModelResponse> {
        let mut state = self.state.lock().await;
        state.requests.push(request.clone());

        let Some(last) = self.responses.len().checked_sub(1) else {
            bail!("Replay script is empty");
        };
        let index = state.cursor.min(last);
        state.cursor += 1;
        Ok(ModelResponse::new(self.responses[index].clone()))
    }
}
