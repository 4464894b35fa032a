//! Shared request/result types for the orchestration layer.
//!
//! Everything wire-visible derives serde; results are produced once per
//! request and never mutated after return. The invariant on
//! [`ConversionResult`] is that a failed result always carries a non-empty
//! error string, and a successful three-style result always carries a
//! non-empty variant map.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::profile::{NegativePreferences, StyleProfile};
use crate::routing::ConversionReason;

// ---------------------------------------------------------------------------
// Context labels
// ---------------------------------------------------------------------------

/// Conversational context attached to a request.
///
/// Open enum: unknown labels pass through as [`ContextLabel::Other`] rather
/// than failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextLabel {
    Business,
    Report,
    Personal,
    Casual,
    Other(String),
}

impl ContextLabel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Business => "business",
            Self::Report => "report",
            Self::Personal => "personal",
            Self::Casual => "casual",
            Self::Other(label) => label,
        }
    }

    /// Contexts that lower the formality bar for auto-escalation.
    pub fn is_formal(&self) -> bool {
        matches!(self, Self::Business | Self::Report)
    }
}

impl From<&str> for ContextLabel {
    fn from(label: &str) -> Self {
        match label {
            "business" => Self::Business,
            "report" => Self::Report,
            "personal" => Self::Personal,
            "casual" => Self::Casual,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ContextLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ContextLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContextLabel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(ContextLabel::from(label.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Style variants
// ---------------------------------------------------------------------------

/// One of the three tone-adjusted renderings of the same content.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StyleVariant {
    Direct,
    Gentle,
    Neutral,
}

impl StyleVariant {
    pub const ALL: [StyleVariant; 3] =
        [StyleVariant::Direct, StyleVariant::Gentle, StyleVariant::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Gentle => "gentle",
            Self::Neutral => "neutral",
        }
    }

    /// Pick the refinement style for a directness level: 4 and above is
    /// direct, 2 and below is gentle, the middle is neutral.
    pub fn for_directness(level: u8) -> Self {
        if level >= 4 {
            Self::Direct
        } else if level <= 2 {
            Self::Gentle
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for StyleVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Capability descriptor
// ---------------------------------------------------------------------------

/// Availability of an optional collaborator, established once at
/// construction time and carried through instead of re-probed per call.
#[derive(Debug, Clone)]
pub enum Capability<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Capability<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Available(inner) => Some(inner),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

fn default_context() -> ContextLabel {
    ContextLabel::Business
}

/// A tone-conversion request. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    pub text: String,
    #[serde(default)]
    pub profile: StyleProfile,
    #[serde(default = "default_context")]
    pub context: ContextLabel,
    /// Request-scoped negative-preference overrides, folded on top of the
    /// profile's switches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_overrides: Option<NegativePreferences>,
    #[serde(default)]
    pub force_convert: bool,
}

impl ConversionRequest {
    /// Profile with the request's negative-preference overrides applied.
    pub fn effective_profile(&self) -> StyleProfile {
        self.profile
            .with_negative_overrides(self.negative_overrides.as_ref())
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// How a result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMethod {
    /// No generation ran (routing declined).
    None,
    /// Specialized endpoint primary stage plus refinement.
    LoraGpt,
    /// General model only (specialized endpoint skipped or degraded).
    GptOnly,
    /// Three-variant style fan-out.
    ThreeStyle,
    /// Single grounded answer.
    RagAnswer,
    /// Orchestration failed unexpectedly.
    Error,
}

impl GenerationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::LoraGpt => "lora_gpt",
            Self::GptOnly => "gpt_only",
            Self::ThreeStyle => "three_style",
            Self::RagAnswer => "rag_answer",
            Self::Error => "error",
        }
    }
}

/// Citation for one retrieved passage attached to a grounded result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    /// 1-based retrieval rank.
    pub rank: usize,
    pub source: String,
    /// Display preview, truncated; not the text fed to generation.
    pub preview: String,
}

/// Provenance metadata carried on every result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub request_id: Uuid,
    pub model_used: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_retrieved: Option<usize>,
}

impl ResultMetadata {
    pub fn new(model_used: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            model_used: model_used.into(),
            generated_at: Utc::now(),
            documents_retrieved: None,
        }
    }
}

/// Outcome of a conversion, style fan-out, or grounded Q&A request.
///
/// Produced once per request; never mutated after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub success: bool,
    /// Single converted text (two-stage pipeline mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_text: Option<String>,
    /// Style-variant renderings (three-style mode).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variants: BTreeMap<StyleVariant, String>,
    /// Single grounded answer (Q&A mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceCitation>,
    /// Truncated preview of the grounding block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag_context: Option<String>,
    pub method: GenerationMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ConversionReason>,
    #[serde(default)]
    pub forced: bool,
    pub metadata: ResultMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversionResult {
    fn empty(method: GenerationMethod, model: impl Into<String>) -> Self {
        Self {
            success: false,
            converted_text: None,
            variants: BTreeMap::new(),
            answer: None,
            sources: Vec::new(),
            rag_context: None,
            method,
            reason: None,
            forced: false,
            metadata: ResultMetadata::new(model),
            error: None,
        }
    }

    /// Routing declined to escalate. A normal outcome, not an error.
    pub fn rejected(reason: ConversionReason) -> Self {
        let mut result = Self::empty(GenerationMethod::None, "none");
        result.reason = Some(reason);
        result.error = Some("request does not meet conversion conditions".to_string());
        result
    }

    /// Structured failure with the given method tag.
    pub fn failed(method: GenerationMethod, error: impl Into<String>) -> Self {
        let mut result = Self::empty(method, "none");
        result.error = Some(error.into());
        result
    }

    /// Successful two-stage conversion.
    pub fn converted(
        text: impl Into<String>,
        method: GenerationMethod,
        reason: ConversionReason,
        forced: bool,
        model: impl Into<String>,
    ) -> Self {
        let mut result = Self::empty(method, model);
        result.success = true;
        result.converted_text = Some(text.into());
        result.reason = Some(reason);
        result.forced = forced;
        result
    }

    /// Successful three-variant fan-out. `variants` must not be empty.
    pub fn styled(variants: BTreeMap<StyleVariant, String>, model: impl Into<String>) -> Self {
        debug_assert!(!variants.is_empty());
        let mut result = Self::empty(GenerationMethod::ThreeStyle, model);
        result.success = true;
        result.variants = variants;
        result
    }

    /// Successful single grounded answer.
    pub fn answered(answer: impl Into<String>, model: impl Into<String>) -> Self {
        let mut result = Self::empty(GenerationMethod::RagAnswer, model);
        result.success = true;
        result.answer = Some(answer.into());
        result
    }

    pub fn with_reason(mut self, reason: ConversionReason) -> Self {
        self.reason = Some(reason);
        self
    }

    pub fn with_sources(mut self, sources: Vec<SourceCitation>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_rag_context(mut self, preview: impl Into<String>) -> Self {
        self.rag_context = Some(preview.into());
        self
    }

    pub fn with_documents_retrieved(mut self, count: usize) -> Self {
        self.metadata.documents_retrieved = Some(count);
        self
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// One piece of user feedback on a generated variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub user_id: String,
    pub selected_variant: StyleVariant,
    /// 1–5 when present; absence routes to the basic heuristic path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_label_round_trip() {
        for label in ["business", "report", "personal", "casual", "memo"] {
            let context = ContextLabel::from(label);
            let json = serde_json::to_string(&context).unwrap();
            assert_eq!(json, format!("\"{label}\""));
            let back: ContextLabel = serde_json::from_str(&json).unwrap();
            assert_eq!(back, context);
        }
        assert_eq!(
            ContextLabel::from("memo"),
            ContextLabel::Other("memo".into())
        );
    }

    #[test]
    fn only_business_and_report_are_formal() {
        assert!(ContextLabel::Business.is_formal());
        assert!(ContextLabel::Report.is_formal());
        assert!(!ContextLabel::Personal.is_formal());
        assert!(!ContextLabel::Other("memo".into()).is_formal());
    }

    #[test]
    fn variant_for_directness_thresholds() {
        assert_eq!(StyleVariant::for_directness(1), StyleVariant::Gentle);
        assert_eq!(StyleVariant::for_directness(2), StyleVariant::Gentle);
        assert_eq!(StyleVariant::for_directness(3), StyleVariant::Neutral);
        assert_eq!(StyleVariant::for_directness(4), StyleVariant::Direct);
        assert_eq!(StyleVariant::for_directness(10), StyleVariant::Direct);
    }

    #[test]
    fn rejected_result_carries_error_and_no_output() {
        let result = ConversionResult::rejected(ConversionReason::ConditionNotMet);
        assert!(!result.success);
        assert!(result.error.is_some());
        assert!(result.converted_text.is_none());
        assert!(result.variants.is_empty());
        assert_eq!(result.method, GenerationMethod::None);
    }

    #[test]
    fn styled_result_serializes_variant_keys_lowercase() {
        let mut variants = BTreeMap::new();
        variants.insert(StyleVariant::Direct, "a".to_string());
        variants.insert(StyleVariant::Neutral, "b".to_string());
        let result = ConversionResult::styled(variants, "test-model");

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["variants"]["direct"], "a");
        assert_eq!(json["variants"]["neutral"], "b");
        assert_eq!(json["method"], "three_style");
        assert_eq!(json["metadata"]["modelUsed"], "test-model");
    }

    #[test]
    fn conversion_request_applies_negative_overrides() {
        use crate::profile::{NegativePreferences, Strictness};

        let request = ConversionRequest {
            text: "hello".into(),
            profile: StyleProfile::default(),
            context: ContextLabel::Personal,
            negative_overrides: Some(NegativePreferences {
                emoticon_usage: Some(Strictness::Strict),
                ..Default::default()
            }),
            force_convert: false,
        };
        let profile = request.effective_profile();
        assert_eq!(
            profile.negative_preferences.emoticon_usage,
            Some(Strictness::Strict)
        );
    }

    #[test]
    fn conversion_request_defaults() {
        let request: ConversionRequest = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
        assert_eq!(request.context, ContextLabel::Business);
        assert!(!request.force_convert);
    }

    #[test]
    fn capability_accessors() {
        let available: Capability<u32> = Capability::Available(7);
        assert!(available.is_available());
        assert_eq!(available.get(), Some(&7));
        assert_eq!(available.reason(), None);

        let unavailable: Capability<u32> = Capability::unavailable("down");
        assert!(!unavailable.is_available());
        assert_eq!(unavailable.reason(), Some("down"));
    }
}
