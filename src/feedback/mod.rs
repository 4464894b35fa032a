//! Feedback adaptation router.
//!
//! Routes user feedback between the statistical preference-store path
//! ("advanced") and the heuristic style-converter path ("basic"). The two
//! paths are mutually exclusive per call; advanced is attempted first and
//! only when a rating is present. Feedback processing never raises past
//! this boundary.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::conversion::{StyleAdjustment, StyleConverter};
use crate::preferences::PreferenceStore;
use crate::profile::StyleProfile;
use crate::types::{Capability, StyleVariant};

/// Which path processed a piece of feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMethod {
    /// Statistical adaptation through the preference store.
    Advanced,
    /// Heuristic adjustment through the style converter.
    Basic,
    /// No path was available.
    None,
    /// Processing failed unexpectedly.
    Error,
}

/// Structured outcome of one feedback event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackOutcome {
    pub success: bool,
    pub processing_method: ProcessingMethod,
    /// The profile after processing; unchanged on failure.
    pub updated_profile: StyleProfile,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adjustments: Vec<StyleAdjustment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FeedbackOutcome {
    fn advanced(profile: StyleProfile) -> Self {
        Self {
            success: true,
            processing_method: ProcessingMethod::Advanced,
            updated_profile: profile,
            adjustments: Vec::new(),
            error: None,
        }
    }

    fn basic(profile: StyleProfile, adjustments: Vec<StyleAdjustment>) -> Self {
        Self {
            success: true,
            processing_method: ProcessingMethod::Basic,
            updated_profile: profile,
            adjustments,
            error: None,
        }
    }

    fn unavailable(profile: StyleProfile, reason: &str) -> Self {
        Self {
            success: false,
            processing_method: ProcessingMethod::None,
            updated_profile: profile,
            adjustments: Vec::new(),
            error: Some(format!("no feedback path available: {reason}")),
        }
    }

    fn failed(profile: StyleProfile, error: &str) -> Self {
        Self {
            success: false,
            processing_method: ProcessingMethod::Error,
            updated_profile: profile,
            adjustments: Vec::new(),
            error: Some(format!("feedback processing failed: {error}")),
        }
    }
}

/// Routes feedback to the advanced or basic adaptation path.
pub struct FeedbackRouter {
    store: Capability<Arc<dyn PreferenceStore>>,
    converter: Capability<Arc<StyleConverter>>,
}

impl FeedbackRouter {
    pub fn new(
        store: Capability<Arc<dyn PreferenceStore>>,
        converter: Capability<Arc<StyleConverter>>,
    ) -> Self {
        Self { store, converter }
    }

    /// Process one feedback event.
    ///
    /// A supplied rating first attempts the advanced path; on success the
    /// basic path is skipped entirely. Without a rating, or when the
    /// advanced path is unavailable or declines, the basic heuristic runs.
    pub async fn process_feedback(
        &self,
        comment: &str,
        profile: &StyleProfile,
        rating: Option<u8>,
        selected_variant: StyleVariant,
    ) -> FeedbackOutcome {
        let mut advanced_error: Option<String> = None;
        if let (Some(rating), Capability::Available(store)) = (rating, &self.store) {
            match store
                .adapt_style(profile.user_id_or_unknown(), comment, rating, selected_variant)
                .await
            {
                Ok(true) => {
                    tracing::info!(
                        user_id = profile.user_id_or_unknown(),
                        rating,
                        "advanced feedback adaptation applied"
                    );
                    let updated = store
                        .load_profile(profile.user_id_or_unknown())
                        .await
                        .ok()
                        .flatten()
                        .unwrap_or_else(|| profile.clone());
                    return FeedbackOutcome::advanced(updated);
                }
                Ok(false) => {
                    tracing::debug!("advanced path declined; falling back to basic");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "advanced path failed; falling back to basic");
                    advanced_error = Some(e.to_string());
                }
            }
        }

        match (&self.converter, advanced_error) {
            (Capability::Available(converter), _) => {
                let (updated, adjustments) = converter.apply_feedback(comment, profile);
                FeedbackOutcome::basic(updated, adjustments)
            }
            // The advanced path actually ran and failed, and there is no
            // basic path left to absorb the event.
            (Capability::Unavailable { .. }, Some(error)) => {
                FeedbackOutcome::failed(profile.clone(), &error)
            }
            (Capability::Unavailable { reason }, None) => {
                FeedbackOutcome::unavailable(profile.clone(), reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::OrchestrationError;
    use crate::llm::LanguageModel;
    use crate::preferences::InMemoryPreferenceStore;
    use crate::prompts::StylePromptBuilder;

    struct EchoModel;

    #[async_trait]
    impl LanguageModel for EchoModel {
        fn model(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str) -> Result<String, OrchestrationError> {
            Ok(prompt.to_string())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl crate::preferences::PreferenceStore for FailingStore {
        async fn adapt_style(
            &self,
            _user_id: &str,
            _feedback_text: &str,
            _rating: u8,
            _selected_variant: StyleVariant,
        ) -> Result<bool, OrchestrationError> {
            Err(OrchestrationError::Transport("store down".into()))
        }

        async fn save_profile(&self, _profile: &StyleProfile) -> Result<(), OrchestrationError> {
            Ok(())
        }

        async fn load_profile(
            &self,
            _user_id: &str,
        ) -> Result<Option<StyleProfile>, OrchestrationError> {
            Ok(None)
        }
    }

    fn converter() -> Arc<StyleConverter> {
        Arc::new(StyleConverter::new(
            Arc::new(EchoModel),
            Arc::new(StylePromptBuilder::new().unwrap()),
        ))
    }

    fn profile() -> StyleProfile {
        StyleProfile::for_user("u-1")
    }

    #[tokio::test]
    async fn rated_feedback_uses_advanced_path() {
        let store: Arc<dyn PreferenceStore> = Arc::new(InMemoryPreferenceStore::new());
        let router = FeedbackRouter::new(
            Capability::Available(store),
            Capability::Available(converter()),
        );

        let outcome = router
            .process_feedback("sharper please", &profile(), Some(5), StyleVariant::Direct)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.processing_method, ProcessingMethod::Advanced);
        // The advanced path adapted the stored profile; no heuristic
        // adjustments are reported.
        assert!(outcome.adjustments.is_empty());
        assert_eq!(outcome.updated_profile.base_directness, Some(6));
    }

    #[tokio::test]
    async fn unrated_feedback_uses_basic_path() {
        let store: Arc<dyn PreferenceStore> = Arc::new(InMemoryPreferenceStore::new());
        let router = FeedbackRouter::new(
            Capability::Available(store),
            Capability::Available(converter()),
        );

        let outcome = router
            .process_feedback("too formal", &profile(), None, StyleVariant::Neutral)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.processing_method, ProcessingMethod::Basic);
        assert_eq!(outcome.adjustments.len(), 1);
        assert_eq!(outcome.updated_profile.base_formality, Some(4));
    }

    #[tokio::test]
    async fn unavailable_store_falls_through_to_basic() {
        let router = FeedbackRouter::new(
            Capability::unavailable("store not configured"),
            Capability::Available(converter()),
        );

        let outcome = router
            .process_feedback("too formal", &profile(), Some(5), StyleVariant::Direct)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.processing_method, ProcessingMethod::Basic);
    }

    #[tokio::test]
    async fn failing_store_falls_through_to_basic() {
        let store: Arc<dyn PreferenceStore> = Arc::new(FailingStore);
        let router = FeedbackRouter::new(
            Capability::Available(store),
            Capability::Available(converter()),
        );

        let outcome = router
            .process_feedback("warmer please", &profile(), Some(4), StyleVariant::Gentle)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.processing_method, ProcessingMethod::Basic);
    }

    #[tokio::test]
    async fn store_failure_without_basic_path_is_an_error_outcome() {
        let store: Arc<dyn PreferenceStore> = Arc::new(FailingStore);
        let router = FeedbackRouter::new(
            Capability::Available(store),
            Capability::unavailable("converter not configured"),
        );

        let original = profile();
        let outcome = router
            .process_feedback("sharper please", &original, Some(5), StyleVariant::Direct)
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.processing_method, ProcessingMethod::Error);
        assert_eq!(outcome.updated_profile, original);
        assert!(outcome.error.unwrap().contains("store down"));
    }

    #[tokio::test]
    async fn no_path_available_is_structured_failure() {
        let router = FeedbackRouter::new(
            Capability::unavailable("store not configured"),
            Capability::unavailable("converter not configured"),
        );

        let original = profile();
        let outcome = router
            .process_feedback("anything", &original, None, StyleVariant::Neutral)
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.processing_method, ProcessingMethod::None);
        assert_eq!(outcome.updated_profile, original);
        assert!(outcome.error.is_some());
    }
}
