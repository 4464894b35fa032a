//! Error taxonomy for the orchestration layer.
//!
//! Public operations never let these escape: transport failures are
//! recovered by substitution as close to the call site as possible, and
//! anything that reaches an operation's outer boundary is converted into a
//! structured failure result.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// Network or timeout failure talking to an external endpoint.
    /// Recovered locally by substitution; never surfaced as-is to callers.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The document index is not initialized or returned zero passages.
    /// Terminal for the request, not retried.
    #[error("grounding unavailable: {0}")]
    GroundingUnavailable(String),

    /// A prompt template failed to render.
    #[error("template rendering failed: {0}")]
    Template(#[from] tera::Error),

    /// The generation service returned an unusable response.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Anything else that surfaced during orchestration.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<reqwest::Error> for OrchestrationError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
