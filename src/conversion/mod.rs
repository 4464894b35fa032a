//! Style conversion engine.
//!
//! Produces the three tone variants (direct / gentle / neutral) of one input
//! concurrently, and owns the basic feedback-to-adjustment heuristic used
//! when statistical preference adaptation is unavailable.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::OrchestrationError;
use crate::llm::LanguageModel;
use crate::profile::{clamp_level, StyleProfile};
use crate::prompts::PromptTemplates;
use crate::types::{ContextLabel, ConversionResult, GenerationMethod, StyleVariant};

// ---------------------------------------------------------------------------
// Feedback heuristics
// ---------------------------------------------------------------------------

/// Tone axis adjusted by feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleAxis {
    Formality,
    Friendliness,
    Expressiveness,
    Directness,
}

/// A single heuristic adjustment derived from feedback text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleAdjustment {
    pub axis: StyleAxis,
    pub delta: i8,
}

static FEEDBACK_PATTERNS: Lazy<Vec<(Regex, StyleAxis, i8)>> = Lazy::new(|| {
    let pattern = |p: &str| Regex::new(p).expect("feedback pattern is valid");
    vec![
        (
            pattern(r"(?i)too (formal|stiff)|less formal|too polite"),
            StyleAxis::Formality,
            -1,
        ),
        (
            pattern(r"(?i)too casual|more (formal|polite)|not polite enough"),
            StyleAxis::Formality,
            1,
        ),
        (
            pattern(r"(?i)too (blunt|direct|harsh)|softer|gentler"),
            StyleAxis::Directness,
            -1,
        ),
        (
            pattern(r"(?i)more direct|too (vague|roundabout)|get to the point"),
            StyleAxis::Directness,
            1,
        ),
        (
            pattern(r"(?i)too (friendly|chatty|familiar)"),
            StyleAxis::Friendliness,
            -1,
        ),
        (
            pattern(r"(?i)friendlier|warmer|too cold|too distant"),
            StyleAxis::Friendliness,
            1,
        ),
        (
            pattern(r"(?i)too (emotional|dramatic)|tone it down"),
            StyleAxis::Expressiveness,
            -1,
        ),
        (
            pattern(r"(?i)more (expressive|lively)|too (flat|bland|dry)"),
            StyleAxis::Expressiveness,
            1,
        ),
    ]
});

// ---------------------------------------------------------------------------
// StyleConverter
// ---------------------------------------------------------------------------

/// Fans one input out into three style variants via the generation service.
pub struct StyleConverter {
    llm: Arc<dyn LanguageModel>,
    prompts: Arc<dyn PromptTemplates>,
}

impl StyleConverter {
    pub fn new(llm: Arc<dyn LanguageModel>, prompts: Arc<dyn PromptTemplates>) -> Self {
        Self { llm, prompts }
    }

    /// Model tag for provenance metadata.
    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Generate all three variants concurrently.
    ///
    /// All-or-nothing: a failed variant fails the whole conversion, so a
    /// successful result always carries the complete variant map.
    pub async fn convert_text(
        &self,
        input: &str,
        profile: &StyleProfile,
        context: &ContextLabel,
    ) -> ConversionResult {
        match self.generate_variants(input, profile, context).await {
            Ok(variants) => ConversionResult::styled(variants, self.llm.model()),
            Err(e) => {
                tracing::warn!(error = %e, "style fan-out failed");
                ConversionResult::failed(
                    GenerationMethod::Error,
                    format!("style conversion failed: {e}"),
                )
            }
        }
    }

    async fn generate_variants(
        &self,
        input: &str,
        profile: &StyleProfile,
        context: &ContextLabel,
    ) -> Result<BTreeMap<StyleVariant, String>, OrchestrationError> {
        let instructions = self.prompts.style_instructions(profile, context);

        let prompt_for = |variant: StyleVariant| {
            let instruction = instructions
                .get(&variant)
                .map(String::as_str)
                .unwrap_or_default();
            format!("{instruction}\nMessage:\n{input}")
        };

        // The prompts must outlive the joined futures borrowing them.
        let direct_prompt = prompt_for(StyleVariant::Direct);
        let gentle_prompt = prompt_for(StyleVariant::Gentle);
        let neutral_prompt = prompt_for(StyleVariant::Neutral);

        let (direct, gentle, neutral) = futures::join!(
            self.llm.generate(&direct_prompt),
            self.llm.generate(&gentle_prompt),
            self.llm.generate(&neutral_prompt),
        );

        let mut variants = BTreeMap::new();
        variants.insert(StyleVariant::Direct, direct?);
        variants.insert(StyleVariant::Gentle, gentle?);
        variants.insert(StyleVariant::Neutral, neutral?);
        Ok(variants)
    }

    /// Basic feedback path: map free-text feedback onto level adjustments.
    ///
    /// Each matching pattern contributes one step on its axis; results are
    /// clamped to the 1–10 scale and written to the base levels of the
    /// returned profile. The input profile is untouched.
    pub fn apply_feedback(
        &self,
        comment: &str,
        profile: &StyleProfile,
    ) -> (StyleProfile, Vec<StyleAdjustment>) {
        let mut adjustments = Vec::new();
        for (regex, axis, delta) in FEEDBACK_PATTERNS.iter() {
            if regex.is_match(comment) {
                adjustments.push(StyleAdjustment {
                    axis: *axis,
                    delta: *delta,
                });
            }
        }

        let mut updated = profile.clone();
        for adjustment in &adjustments {
            let delta = adjustment.delta as i16;
            match adjustment.axis {
                StyleAxis::Formality => {
                    updated.base_formality =
                        Some(clamp_level(profile.effective_formality() as i16 + delta));
                }
                StyleAxis::Friendliness => {
                    updated.base_friendliness =
                        Some(clamp_level(profile.effective_friendliness() as i16 + delta));
                }
                StyleAxis::Expressiveness => {
                    updated.base_expressiveness =
                        Some(clamp_level(profile.effective_expressiveness() as i16 + delta));
                }
                StyleAxis::Directness => {
                    updated.base_directness =
                        Some(clamp_level(profile.effective_directness() as i16 + delta));
                }
            }
        }

        (updated, adjustments)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct EchoModel;

    #[async_trait]
    impl LanguageModel for EchoModel {
        fn model(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str) -> Result<String, OrchestrationError> {
            Ok(format!("out: {}", prompt.lines().last().unwrap_or_default()))
        }
    }

    struct RecordingModel {
        prompts: parking_lot::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        fn model(&self) -> &str {
            "recording"
        }

        async fn generate(&self, prompt: &str) -> Result<String, OrchestrationError> {
            self.prompts.lock().push(prompt.to_string());
            Ok("ok".to_string())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl LanguageModel for FailingModel {
        fn model(&self) -> &str {
            "failing"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, OrchestrationError> {
            Err(OrchestrationError::Transport("connection refused".into()))
        }
    }

    fn converter(llm: Arc<dyn LanguageModel>) -> StyleConverter {
        let prompts = Arc::new(crate::prompts::StylePromptBuilder::new().unwrap());
        StyleConverter::new(llm, prompts)
    }

    #[tokio::test]
    async fn produces_all_three_variants() {
        let converter = converter(Arc::new(EchoModel));
        let result = converter
            .convert_text(
                "see you tomorrow",
                &StyleProfile::default(),
                &ContextLabel::Personal,
            )
            .await;

        assert!(result.success);
        assert_eq!(result.variants.len(), 3);
        assert!(result.variants[&StyleVariant::Direct].starts_with("out:"));
        assert_eq!(result.metadata.model_used, "echo");
    }

    #[tokio::test]
    async fn each_variant_receives_its_own_instruction() {
        let model = Arc::new(RecordingModel {
            prompts: parking_lot::Mutex::new(Vec::new()),
        });
        let converter = converter(model.clone());
        let result = converter
            .convert_text("ship it", &StyleProfile::default(), &ContextLabel::Business)
            .await;
        assert!(result.success);

        let prompts = model.prompts.lock();
        assert_eq!(prompts.len(), 3);
        assert!(prompts.iter().all(|p| p.ends_with("Message:\nship it")));
        assert!(prompts.iter().any(|p| p.contains("direct tone")));
        assert!(prompts.iter().any(|p| p.contains("gentle tone")));
        assert!(prompts.iter().any(|p| p.contains("neutral tone")));
    }

    #[tokio::test]
    async fn any_variant_failure_fails_the_conversion() {
        let converter = converter(Arc::new(FailingModel));
        let result = converter
            .convert_text("hi", &StyleProfile::default(), &ContextLabel::Casual)
            .await;

        assert!(!result.success);
        assert!(result.variants.is_empty());
        assert!(result.error.unwrap().contains("style conversion failed"));
    }

    #[test]
    fn feedback_lowers_formality_on_too_stiff() {
        let converter = converter(Arc::new(EchoModel));
        let profile = StyleProfile {
            base_formality: Some(7),
            ..Default::default()
        };
        let (updated, adjustments) = converter.apply_feedback("this reads too stiff", &profile);
        assert_eq!(updated.base_formality, Some(6));
        assert_eq!(adjustments.len(), 1);
        assert_eq!(adjustments[0].axis, StyleAxis::Formality);
        assert_eq!(adjustments[0].delta, -1);
    }

    #[test]
    fn feedback_raises_directness_on_too_vague() {
        let converter = converter(Arc::new(EchoModel));
        let (updated, adjustments) =
            converter.apply_feedback("too vague, get to the point", &StyleProfile::default());
        // Both phrases match the same pattern set once.
        assert!(adjustments
            .iter()
            .any(|a| a.axis == StyleAxis::Directness && a.delta == 1));
        assert_eq!(updated.base_directness, Some(6));
    }

    #[test]
    fn feedback_clamps_at_scale_bounds() {
        let converter = converter(Arc::new(EchoModel));
        let profile = StyleProfile {
            base_formality: Some(1),
            ..Default::default()
        };
        let (updated, _) = converter.apply_feedback("way too formal", &profile);
        assert_eq!(updated.base_formality, Some(1));
    }

    #[test]
    fn unrelated_feedback_leaves_profile_unchanged() {
        let converter = converter(Arc::new(EchoModel));
        let profile = StyleProfile::default();
        let (updated, adjustments) = converter.apply_feedback("thanks, looks great", &profile);
        assert!(adjustments.is_empty());
        assert_eq!(updated, profile);
    }
}
