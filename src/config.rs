//! Process configuration, read once from the environment at startup.

use std::time::Duration;

/// Environment variable for the specialized inference endpoint base URL.
pub const SPECIALIZED_URL_VAR: &str = "TONEPILOT_SPECIALIZED_URL";

/// Runtime settings for the service.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the specialized fine-tuned inference endpoint.
    pub specialized_url: String,
    /// API key for the general-purpose generation service.
    pub openai_api_key: Option<String>,
    /// Base URL for the general-purpose generation service.
    pub openai_base_url: String,
    /// Model name used for refinement and style fan-out.
    pub model: String,
    /// Sampling temperature for the general model.
    pub temperature: f64,
    /// Token budget for specialized generation calls.
    pub max_new_tokens: u32,
    /// Sampling temperature for specialized generation calls.
    pub specialized_temperature: f64,
    /// Per-call timeout for specialized generation.
    pub generate_timeout: Duration,
    /// Timeout for the one-time health probe.
    pub probe_timeout: Duration,
    /// Optional directory of plain-text documents to seed the index from.
    pub documents_dir: Option<String>,
    /// HTTP port for the server binary.
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            specialized_url: "http://localhost:8000".to_string(),
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.3,
            max_new_tokens: 256,
            specialized_temperature: 0.7,
            generate_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
            documents_dir: None,
            port: 8080,
        }
    }
}

impl Settings {
    /// Read settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(url) = std::env::var(SPECIALIZED_URL_VAR) {
            settings.specialized_url = url;
        }
        settings.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            settings.openai_base_url = url;
        }
        if let Ok(model) = std::env::var("TONEPILOT_MODEL") {
            settings.model = model;
        }
        settings.documents_dir = std::env::var("TONEPILOT_DOCS_DIR").ok();
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            settings.port = port;
        }
        settings
    }
}
