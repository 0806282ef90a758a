//! Responder — produces the persona's free-text reply for one turn.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::llm_client::{ChatBackend, CompletionRequest, LlmError};
use crate::models::message::Message;

/// Generates a reply to `message` given the prior `history` and a system prompt.
///
/// `history` must not already contain `message`; implementations append it.
/// No retries: the control loop owns the only retry there is.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn generate_reply(
        &self,
        history: &[Message],
        message: &str,
        system: &str,
    ) -> Result<String, AppError>;
}

/// Responder backed by a chat-completion model.
pub struct LlmResponder {
    backend: Arc<dyn ChatBackend>,
    model: String,
}

impl LlmResponder {
    pub fn new(backend: Arc<dyn ChatBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Responder for LlmResponder {
    async fn generate_reply(
        &self,
        history: &[Message],
        message: &str,
        system: &str,
    ) -> Result<String, AppError> {
        let messages = build_messages(history, message, system);

        let reply = self
            .backend
            .complete(CompletionRequest {
                model: &self.model,
                messages: &messages,
                response_format: None,
            })
            .await?;

        if reply.trim().is_empty() {
            return Err(AppError::Upstream(LlmError::EmptyContent));
        }
        Ok(reply)
    }
}

/// `[system] + history + [user message]`, the order every provider expects.
fn build_messages(history: &[Message], message: &str, system: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system));
    messages.extend_from_slice(history);
    messages.push(Message::user(message));
    messages
}
