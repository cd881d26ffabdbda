//! Deterministic backend that replays a fixed script.
//!
//! Each `chat` call pops the next scripted reply (or error) and records what
//! it was asked. Running past the end of the script is an error.

use crate::traits::{ChatRequest, Message, Provider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// What a scripted backend saw on one call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Message, String>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, message: Message) -> Self {
        self.push(Ok(message));
        self
    }

    pub fn reply_text(self, content: impl Into<String>) -> Self {
        self.reply(Message::assistant(content))
    }

    /// Scripts a backend failure with the given message.
    pub fn fail(self, error: impl Into<String>) -> Self {
        self.push(Err(error.into()));
        self
    }

    pub fn push(&self, entry: Result<Message, String>) {
        lock(&self.script).push_back(entry);
    }

    pub fn remaining(&self) -> usize {
        lock(&self.script).len()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: ChatRequest<'_>) -> anyhow::Result<Message> {
        lock(&self.requests).push(RecordedRequest {
            model: request.model.to_string(),
            messages: request.messages.to_vec(),
            tools: request.tools.iter().map(|t| t.name.clone()).collect(),
        });

        match lock(&self.script).pop_front() {
            Some(Ok(message)) => Ok(message),
            Some(Err(error)) => Err(anyhow::anyhow!(error)),
            None => Err(anyhow::anyhow!("scripted provider has no replies left")),
        }
    }
}
