//! Reads the profile and summary documents named in `Config`.
//!
//! PDF extraction is CPU-bound; call this from `tokio::task::spawn_blocking`.

use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::errors::AppError;
use crate::persona::PersonaContext;

/// Loads the persona from disk. Any failure is fatal for startup.
pub fn load_persona_context(config: &Config) -> Result<PersonaContext, AppError> {
    let name = config.persona_name.trim();
    if name.is_empty() {
        return Err(AppError::ContextLoad(
            "PROFILE_NAME cannot be empty".to_string(),
        ));
    }

    let profile_path = config.profile_path();
    let summary_path = config.summary_path();

    let profile = load_document(&profile_path)?;
    let summary = read_text(&summary_path)?;

    info!(
        "Loaded persona '{}': profile={} chars ({}), summary={} chars ({})",
        name,
        profile.chars().count(),
        profile_path.display(),
        summary.chars().count(),
        summary_path.display()
    );

    Ok(PersonaContext::new(name, summary.trim(), profile.trim()))
}

/// Plain-text documents are read as-is; everything else is treated as a PDF.
fn load_document(path: &Path) -> Result<String, AppError> {
    let is_text = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "txt" | "md"))
        .unwrap_or(false);

    if is_text {
        read_text(path)
    } else {
        read_pdf(path)
    }
}

fn read_text(path: &Path) -> Result<String, AppError> {
    std::fs::read_to_string(path)
        .map_err(|e| AppError::ContextLoad(format!("Failed to read {}: {e}", path.display())))
}

fn read_pdf(path: &Path) -> Result<String, AppError> {
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::ContextLoad(format!("Failed to read {}: {e}", path.display())))?;
    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
        AppError::ContextLoad(format!("Failed to extract text from {}: {e}", path.display()))
    })
}
