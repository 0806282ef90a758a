use std::sync::Arc;

use crate::chat::ChatLoop;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Persona-grounded chat pipeline. Read-only; shared by every concurrent turn.
    pub chat: Arc<ChatLoop>,
}
