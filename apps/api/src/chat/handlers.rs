//! Axum route handlers for the Chat API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::message::{Message, Role};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    /// True when the first reply was rejected and this is the corrected one.
    pub rerun: bool,
}

#[derive(Debug, Serialize)]
pub struct PersonaResponse {
    pub name: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/chat
///
/// One user turn. The caller owns the conversation: it sends the prior
/// history each time and appends the returned reply itself.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    validate_request(&request)?;

    let outcome = state
        .chat
        .handle_turn(&request.message, &request.history)
        .await?;

    Ok(Json(ChatResponse {
        reply: outcome.reply,
        rerun: outcome.rerun,
    }))
}

/// GET /api/v1/persona
///
/// Display name for the chat widget header.
pub async fn handle_persona(State(state): State<AppState>) -> Json<PersonaResponse> {
    Json(PersonaResponse {
        name: state.chat.persona().name().to_string(),
    })
}

fn validate_request(request: &ChatRequest) -> Result<(), AppError> {
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }
    if request.history.iter().any(|m| m.role == Role::System) {
        return Err(AppError::Validation(
            "history may only contain user and assistant messages".to_string(),
        ));
    }
    Ok(())
}
