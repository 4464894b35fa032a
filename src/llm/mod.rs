//! Language generation clients.
//!
//! [`LanguageModel`] is the seam to the general-purpose generation service;
//! [`specialized::SpecializedClient`] talks to the domain-fine-tuned
//! endpoint. Both are plain HTTP clients with per-call timeouts; neither
//! performs any CPU-bound work.

pub mod openai;
pub mod specialized;

use async_trait::async_trait;

use crate::error::OrchestrationError;

pub use openai::OpenAiChatClient;
pub use specialized::{EndpointCapability, SpecializedClient};

/// General-purpose language generation service.
///
/// Only prompt-in / text-out is exposed to the orchestration layer; model
/// selection and sampling parameters live with the implementation.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Name of the underlying model, for provenance metadata.
    fn model(&self) -> &str;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, OrchestrationError>;
}
