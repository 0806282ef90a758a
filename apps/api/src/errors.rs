use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// A model backend was unreachable, rate-limited, timed out or errored.
    #[error("Upstream model error: {0}")]
    Upstream(#[from] LlmError),

    /// The evaluator answered, but not in the agreed `Evaluation` shape.
    #[error("Malformed evaluation: {0}")]
    MalformedEvaluation(String),

    /// Startup only: the persona documents could not be read.
    #[error("Context load error: {0}")]
    ContextLoad(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Upstream(e) => {
                tracing::error!("Upstream model error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "The language model is unavailable right now".to_string(),
                )
            }
            AppError::MalformedEvaluation(msg) => {
                tracing::error!("Malformed evaluation: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "MALFORMED_EVALUATION",
                    "The reply could not be quality-checked".to_string(),
                )
            }
            AppError::ContextLoad(msg) => {
                tracing::error!("Context load error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONTEXT_LOAD_ERROR",
                    "Persona context is unavailable".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
