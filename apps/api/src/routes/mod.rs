pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Chat API
        .route("/api/v1/persona", get(handlers::handle_persona))
        .route("/api/v1/chat", post(handlers::handle_chat))
        .with_state(state)
}
