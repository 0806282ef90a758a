//! Persona context — the biographical grounding every prompt is rendered from.
//!
//! Built once at startup by `loader`, then shared read-only as `Arc<PersonaContext>`
//! across all concurrent chat turns.

pub mod loader;

pub use loader::load_persona_context;

/// Who the responder speaks as, and everything it is allowed to know about them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaContext {
    name: String,
    summary: String,
    profile: String,
}

impl PersonaContext {
    pub fn new(
        name: impl Into<String>,
        summary: impl Into<String>,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
            profile: profile.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Full profile text, e.g. extracted from a LinkedIn PDF export.
    pub fn profile(&self) -> &str {
        &self.profile
    }
}
