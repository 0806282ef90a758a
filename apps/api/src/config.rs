use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";

/// Application configuration loaded from environment variables.
/// Resolved once at startup; fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub profile_file: String,
    pub summary_file: String,
    pub persona_name: String,
    pub responder_model: String,
    pub responder_api_key: String,
    pub responder_base_url: String,
    pub evaluator_model: String,
    pub evaluator_api_key: String,
    pub evaluator_base_url: String,
    pub llm_timeout: Duration,
    /// Substring that switches the responder into the pig latin register.
    pub style_trigger: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let llm_timeout_secs = optional_env("LLM_TIMEOUT_SECS", "60")
            .parse::<u64>()
            .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Config {
            data_dir: PathBuf::from(optional_env("PROFILE_DATA_DIR", "data")),
            profile_file: optional_env("PROFILE_PDF", "Profile.pdf"),
            summary_file: optional_env("SUMMARY_TXT", "summary.txt"),
            persona_name: optional_env("PROFILE_NAME", "Ag3nt Sc4rn"),
            responder_model: optional_env("OPENAI_MODEL", "gpt-4o-mini"),
            responder_api_key: require_env("OPENAI_API_KEY")?,
            responder_base_url: optional_env("OPENAI_API_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            evaluator_model: optional_env("GEMINI_MODEL", "gemini-2.0-flash"),
            evaluator_api_key: require_env("GOOGLE_API_KEY")?,
            evaluator_base_url: optional_env("GOOGLE_API_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            llm_timeout: Duration::from_secs(llm_timeout_secs),
            style_trigger: optional_env("STYLE_TRIGGER", "patent"),
            port: optional_env("PORT", "7860")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }

    pub fn profile_path(&self) -> PathBuf {
        self.data_dir.join(&self.profile_file)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.data_dir.join(&self.summary_file)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Fixture with fake credentials; nothing is read from the environment.
#[cfg(test)]
impl Config {
    pub(crate) fn for_tests(data_dir: impl Into<PathBuf>) -> Self {
        Config {
            data_dir: data_dir.into(),
            profile_file: "Profile.pdf".to_string(),
            summary_file: "summary.txt".to_string(),
            persona_name: "Test Name".to_string(),
            responder_model: "gpt-test".to_string(),
            responder_api_key: "fake-openai-key".to_string(),
            responder_base_url: "https://fake.openai/".to_string(),
            evaluator_model: "gemini-test".to_string(),
            evaluator_api_key: "fake-key".to_string(),
            evaluator_base_url: "https://fake.url/".to_string(),
            llm_timeout: Duration::from_secs(5),
            style_trigger: "patent".to_string(),
            port: 7860,
            rust_log: "info".to_string(),
        }
    }
}
