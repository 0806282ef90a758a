//! Evaluator — an independent model grades the responder's candidate reply.
//!
//! The backend is asked for strict structured output (`response_format` with
//! the `Evaluation` JSON schema). Whatever comes back is still decoded through
//! `parse_evaluation`, which yields either a typed `Evaluation` or
//! `AppError::MalformedEvaluation`. Transport failures stay `AppError::Upstream`.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::chat::prompts::{build_evaluator_system_prompt, build_evaluator_user_prompt};
use crate::errors::AppError;
use crate::llm_client::{strip_json_fences, ChatBackend, CompletionRequest, ResponseFormat};
use crate::models::message::Message;
use crate::persona::PersonaContext;

/// Schema name sent to the provider alongside the JSON schema.
const EVALUATION_SCHEMA_NAME: &str = "Evaluation";

/// The grader's verdict on one candidate reply.
///
/// `feedback` only matters when `is_acceptable` is false; it is the reason fed into the rerun.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Evaluation {
    pub is_acceptable: bool,
    pub feedback: String,
}

impl Evaluation {
    pub fn new(is_acceptable: bool, feedback: impl Into<String>) -> Self {
        Self {
            is_acceptable,
            feedback: feedback.into(),
        }
    }
}

#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate_reply(
        &self,
        reply: &str,
        message: &str,
        history: &[Message],
    ) -> Result<Evaluation, AppError>;
}

/// Evaluator backed by a structured-output capable chat model.
pub struct LlmEvaluator {
    backend: Arc<dyn ChatBackend>,
    model: String,
    persona: Arc<PersonaContext>,
    format: ResponseFormat,
}

impl LlmEvaluator {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        model: impl Into<String>,
        persona: Arc<PersonaContext>,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            persona,
            format: ResponseFormat::json_schema::<Evaluation>(EVALUATION_SCHEMA_NAME),
        }
    }
}

#[async_trait]
impl Evaluator for LlmEvaluator {
    async fn evaluate_reply(
        &self,
        reply: &str,
        message: &str,
        history: &[Message],
    ) -> Result<Evaluation, AppError> {
        let messages = [
            Message::system(build_evaluator_system_prompt(&self.persona)),
            Message::user(build_evaluator_user_prompt(reply, message, history)),
        ];

        let raw = self
            .backend
            .complete(CompletionRequest {
                model: &self.model,
                messages: &messages,
                response_format: Some(&self.format),
            })
            .await?;

        parse_evaluation(&raw)
    }
}

/// Decodes the evaluator's raw output. Missing fields, wrong types or
/// non-JSON text are all `MalformedEvaluation`; nothing is defaulted.
pub fn parse_evaluation(raw: &str) -> Result<Evaluation, AppError> {
    let text = strip_json_fences(raw);
    if text.is_empty() {
        return Err(AppError::MalformedEvaluation(
            "evaluator returned empty content".to_string(),
        ));
    }
    serde_json::from_str::<Evaluation>(text).map_err(|e| AppError::MalformedEvaluation(e.to_string()))
}
