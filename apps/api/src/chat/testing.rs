//! Scripted stand-ins for the model backends, shared by the chat tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::chat::evaluator::{Evaluation, Evaluator};
use crate::chat::responder::Responder;
use crate::errors::AppError;
use crate::llm_client::{ChatBackend, CompletionRequest, LlmError};
use crate::models::message::Message;

/// Owned copy of a `CompletionRequest` as the backend received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub response_format: Option<Value>,
}

/// Backend that answers from a queue and records every request.
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedBackend {
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            model: request.model.to_string(),
            messages: request.messages.to_vec(),
            response_format: request
                .response_format
                .map(|f| serde_json::to_value(f).unwrap()),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::NoChoices))
    }
}

/// Responder that returns scripted replies in order and records each system prompt.
pub struct StubResponder {
    replies: Mutex<VecDeque<Result<String, AppError>>>,
    systems: Mutex<Vec<String>>,
}

impl StubResponder {
    pub fn new(replies: Vec<Result<String, AppError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            systems: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.systems.lock().unwrap().len()
    }

    pub fn system_prompts(&self) -> Vec<String> {
        self.systems.lock().unwrap().clone()
    }
}

#[async_trait]
impl Responder for StubResponder {
    async fn generate_reply(
        &self,
        _history: &[Message],
        _message: &str,
        system: &str,
    ) -> Result<String, AppError> {
        self.systems.lock().unwrap().push(system.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AppError::Upstream(LlmError::NoChoices)))
    }
}

/// Evaluator that returns scripted verdicts and records what it was asked to judge.
pub struct StubEvaluator {
    verdicts: Mutex<VecDeque<Result<Evaluation, AppError>>>,
    judged: Mutex<Vec<(String, String, usize)>>,
}

impl StubEvaluator {
    pub fn new(verdicts: Vec<Result<Evaluation, AppError>>) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.into()),
            judged: Mutex::new(Vec::new()),
        }
    }

    pub fn verdict(is_acceptable: bool, feedback: &str) -> Self {
        Self::new(vec![Ok(Evaluation::new(is_acceptable, feedback))])
    }

    pub fn calls(&self) -> usize {
        self.judged.lock().unwrap().len()
    }

    /// `(reply, message, history length)` for each call.
    pub fn judged(&self) -> Vec<(String, String, usize)> {
        self.judged.lock().unwrap().clone()
    }
}

#[async_trait]
impl Evaluator for StubEvaluator {
    async fn evaluate_reply(
        &self,
        reply: &str,
        message: &str,
        history: &[Message],
    ) -> Result<Evaluation, AppError> {
        self.judged
            .lock()
            .unwrap()
            .push((reply.to_string(), message.to_string(), history.len()));
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AppError::Upstream(LlmError::NoChoices)))
    }
}
