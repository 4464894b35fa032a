//! # TonePilot
//!
//! Adaptive tone personalization and document-grounded Q&A orchestration.
//!
//! TonePilot rewrites short text messages in a user's preferred tone and
//! answers questions grounded in indexed documents, producing three style
//! variants (direct / gentle / neutral) of the same content. A routing layer
//! decides per request whether to escalate to a specialized fine-tuned
//! endpoint chained with a refinement call, or to stay on the general-purpose
//! model. A feedback loop adapts per-user style profiles over time.

pub mod config;
pub mod conversion;
pub mod error;
pub mod feedback;
pub mod llm;
pub mod pipeline;
pub mod preferences;
pub mod profile;
pub mod prompts;
pub mod rag;
pub mod registry;
pub mod retrieval;
pub mod routing;
pub mod server;
pub mod types;

pub use conversion::StyleConverter;
pub use feedback::FeedbackRouter;
pub use pipeline::ConversionPipeline;
pub use profile::StyleProfile;
pub use rag::RagEngine;
pub use registry::ServiceRegistry;
pub use routing::{decide, ConversionReason, RoutingDecision};
pub use types::{ContextLabel, ConversionRequest, ConversionResult, StyleVariant};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
