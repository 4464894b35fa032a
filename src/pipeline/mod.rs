//! Two-stage generation pipeline.
//!
//! Escalated requests run a primary conversion on the specialized endpoint
//! followed by a refinement call on the general model. Every external
//! failure degrades locally: a dead specialized endpoint substitutes the
//! original input, a failed refinement returns the unrefined primary output.
//! Only a routing decline is surfaced as a normal negative result.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::llm::specialized::{EndpointCapability, SpecializedClient};
use crate::llm::LanguageModel;
use crate::profile::StyleProfile;
use crate::prompts::PromptTemplates;
use crate::routing::{self, RoutingDecision};
use crate::types::{
    ContextLabel, ConversionRequest, ConversionResult, GenerationMethod, StyleVariant,
};

/// Outcome of the primary (specialized) stage. Degradation is a typed
/// variant, never an exception.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PrimaryOutcome {
    /// The specialized endpoint produced a conversion.
    Specialized(String),
    /// The endpoint was skipped or failed; the original input stands in.
    Degraded { text: String, reason: String },
}

impl PrimaryOutcome {
    fn text(&self) -> &str {
        match self {
            Self::Specialized(text) => text,
            Self::Degraded { text, .. } => text,
        }
    }

    fn method(&self) -> GenerationMethod {
        match self {
            Self::Specialized(_) => GenerationMethod::LoraGpt,
            Self::Degraded { .. } => GenerationMethod::GptOnly,
        }
    }
}

/// Reported component status for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStatus {
    pub endpoint_ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
    /// Fixed specialized-generation parameters, present when the endpoint
    /// is reachable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_new_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub model: String,
}

/// The two-stage conversion pipeline.
pub struct ConversionPipeline {
    capability: EndpointCapability,
    llm: Arc<dyn LanguageModel>,
    prompts: Arc<dyn PromptTemplates>,
}

impl ConversionPipeline {
    /// Construct with a one-time health probe of the specialized endpoint.
    /// The resulting reachability is cached for the pipeline's lifetime;
    /// staleness is accepted and handled by per-call fallback.
    pub async fn connect(
        settings: &Settings,
        llm: Arc<dyn LanguageModel>,
        prompts: Arc<dyn PromptTemplates>,
    ) -> Self {
        let capability = SpecializedClient::probe(settings).await;
        Self::with_capability(capability, llm, prompts)
    }

    /// Construct from an already-established capability descriptor.
    pub fn with_capability(
        capability: EndpointCapability,
        llm: Arc<dyn LanguageModel>,
        prompts: Arc<dyn PromptTemplates>,
    ) -> Self {
        Self {
            capability,
            llm,
            prompts,
        }
    }

    /// Convert `text` to a formal rendering if routing escalates.
    pub async fn convert(
        &self,
        text: &str,
        profile: &StyleProfile,
        context: &ContextLabel,
        force_convert: bool,
    ) -> ConversionResult {
        let decision = routing::decide(profile, context, force_convert);
        if !decision.escalate {
            tracing::info!(reason = decision.reason.as_str(), "conversion declined");
            return ConversionResult::rejected(decision.reason);
        }

        match self
            .run_stages(text, profile, context, decision, force_convert)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "conversion pipeline failed");
                ConversionResult::failed(
                    GenerationMethod::Error,
                    format!("error occurred during conversion: {e}"),
                )
                .with_reason(decision.reason)
            }
        }
    }

    /// Convenience wrapper around [`convert`](Self::convert) for a full
    /// request object.
    pub async fn convert_request(&self, request: &ConversionRequest) -> ConversionResult {
        let profile = request.effective_profile();
        self.convert(
            &request.text,
            &profile,
            &request.context,
            request.force_convert,
        )
        .await
    }

    /// Conversion triggered by an explicit user action; always forced.
    pub async fn convert_by_user_request(
        &self,
        text: &str,
        profile: &StyleProfile,
        context: &ContextLabel,
    ) -> ConversionResult {
        self.convert(text, profile, context, true).await
    }

    pub async fn convert_to_business(
        &self,
        text: &str,
        profile: &StyleProfile,
    ) -> ConversionResult {
        self.convert_by_user_request(text, profile, &ContextLabel::Business)
            .await
    }

    pub async fn convert_to_report(
        &self,
        text: &str,
        profile: &StyleProfile,
    ) -> ConversionResult {
        self.convert_by_user_request(text, profile, &ContextLabel::Report)
            .await
    }

    pub fn status(&self) -> PipelineStatus {
        let params = self.capability.get().map(SpecializedClient::generation_params);
        PipelineStatus {
            endpoint_ready: self.capability.is_available(),
            endpoint_url: self
                .capability
                .get()
                .map(|client| client.base_url().to_string()),
            unavailable_reason: self.capability.reason().map(str::to_string),
            max_new_tokens: params.map(|(tokens, _)| tokens),
            temperature: params.map(|(_, temperature)| temperature),
            model: self.llm.model().to_string(),
        }
    }

    async fn run_stages(
        &self,
        text: &str,
        profile: &StyleProfile,
        context: &ContextLabel,
        decision: RoutingDecision,
        forced: bool,
    ) -> Result<ConversionResult, crate::error::OrchestrationError> {
        let primary = self.primary_stage(text).await;
        let method = primary.method();

        let refined = self.refine(text, primary.text(), profile, context).await;
        let output = match refined {
            Some(refined) => refined,
            // Refinement failed; the primary output is still a plausible
            // result, so return it unrefined rather than failing.
            None => primary.text().to_string(),
        };

        Ok(ConversionResult::converted(
            output,
            method,
            decision.reason,
            forced,
            self.llm.model(),
        ))
    }

    /// Primary specialized-endpoint stage. Never errors: any failure
    /// substitutes the original input.
    async fn primary_stage(&self, text: &str) -> PrimaryOutcome {
        let client = match &self.capability {
            EndpointCapability::Available(client) => client,
            EndpointCapability::Unavailable { reason } => {
                tracing::debug!(%reason, "specialized endpoint skipped");
                return PrimaryOutcome::Degraded {
                    text: text.to_string(),
                    reason: reason.clone(),
                };
            }
        };

        match client.generate(text).await {
            Ok(output) => PrimaryOutcome::Specialized(output),
            Err(e) => {
                tracing::warn!(error = %e, "primary stage degraded to original input");
                PrimaryOutcome::Degraded {
                    text: text.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Refinement stage. Returns `None` on any failure so the caller can
    /// fall back to the primary output.
    async fn refine(
        &self,
        original: &str,
        primary: &str,
        profile: &StyleProfile,
        context: &ContextLabel,
    ) -> Option<String> {
        let variant = StyleVariant::for_directness(profile.style_directness());
        let instructions = self.prompts.style_instructions(profile, context);
        let instruction = instructions
            .get(&variant)
            .or_else(|| instructions.get(&StyleVariant::Neutral))?;

        let prompt = match self.prompts.refinement_prompt(original, primary, instruction) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!(error = %e, "refinement prompt failed to render");
                return None;
            }
        };

        match self.llm.generate(&prompt).await {
            Ok(refined) => Some(refined),
            Err(e) => {
                tracing::warn!(error = %e, "refinement degraded to primary output");
                None
            }
        }
    }
}
