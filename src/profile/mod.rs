//! User style profiles and effective-value resolution.
//!
//! A [`StyleProfile`] carries four tone axes (formality, friendliness,
//! emotional expressiveness, directness) on a 1–10 scale, each with an
//! optional per-session override, plus optional negative-preference switches
//! and a formal-document-mode flag. Session values always win over base
//! values; resolution goes through a single pure function so the fallback
//! chain is testable in isolation from any generation code.

use serde::{Deserialize, Serialize};

/// Default level used for questionnaire-facing axes when a profile carries
/// no value at all.
pub const PROFILE_LEVEL_DEFAULT: u8 = 5;

/// Fallback used by the routing and refinement-style decisions when neither
/// a session nor a base value is present.
///
/// Deliberately lower than [`PROFILE_LEVEL_DEFAULT`]: an empty profile must
/// never auto-escalate to the specialized pipeline, and defaults to the
/// neutral refinement style. The two constants are kept side by side so the
/// asymmetry stays visible.
pub const CONSERVATIVE_LEVEL_FALLBACK: u8 = 3;

/// Resolve an effective level from a session override and a base value.
///
/// Session wins over base; `fallback` is used when both are absent.
pub fn resolve_level(session: Option<u8>, base: Option<u8>, fallback: u8) -> u8 {
    session.or(base).unwrap_or(fallback)
}

// ---------------------------------------------------------------------------
// Negative preferences
// ---------------------------------------------------------------------------

/// How strictly a stylistic avoidance is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    Strict,
    Moderate,
    Lenient,
}

impl Strictness {
    /// Wording used when folding the switch into a prompt instruction.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Strict => "Never use",
            Self::Moderate => "Avoid",
            Self::Lenient => "Prefer to limit",
        }
    }
}

/// Per-user stylistic avoidances, each optionally switched on with its own
/// strictness level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NegativePreferences {
    /// Avoid flowery, ornamental phrasing.
    pub flowery_language: Option<Strictness>,
    /// Avoid repeating the same word or phrase.
    pub repetition: Option<Strictness>,
    /// Avoid comma-heavy sentences.
    pub comma_density: Option<Strictness>,
    /// Avoid bullet-point formatting.
    pub bullet_usage: Option<Strictness>,
    /// Avoid emoticons and emoji.
    pub emoticon_usage: Option<Strictness>,
}

impl NegativePreferences {
    /// True when no switch is set.
    pub fn is_empty(&self) -> bool {
        self.flowery_language.is_none()
            && self.repetition.is_none()
            && self.comma_density.is_none()
            && self.bullet_usage.is_none()
            && self.emoticon_usage.is_none()
    }

    /// Merge request-scoped overrides on top of these preferences.
    ///
    /// A switch present in `overrides` replaces the profile's switch; absent
    /// switches keep the profile value.
    pub fn merged_with(&self, overrides: &NegativePreferences) -> NegativePreferences {
        NegativePreferences {
            flowery_language: overrides.flowery_language.or(self.flowery_language),
            repetition: overrides.repetition.or(self.repetition),
            comma_density: overrides.comma_density.or(self.comma_density),
            bullet_usage: overrides.bullet_usage.or(self.bullet_usage),
            emoticon_usage: overrides.emoticon_usage.or(self.emoticon_usage),
        }
    }

    /// Iterate set switches as (subject, strictness) pairs for prompt
    /// assembly.
    pub fn active(&self) -> Vec<(&'static str, Strictness)> {
        let mut out = Vec::new();
        if let Some(s) = self.flowery_language {
            out.push(("flowery or ornamental language", s));
        }
        if let Some(s) = self.repetition {
            out.push(("repeating the same word or phrase", s));
        }
        if let Some(s) = self.comma_density {
            out.push(("comma-heavy sentences", s));
        }
        if let Some(s) = self.bullet_usage {
            out.push(("bullet-point lists", s));
        }
        if let Some(s) = self.emoticon_usage {
            out.push(("emoticons and emoji", s));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// StyleProfile
// ---------------------------------------------------------------------------

/// A user's tone profile.
///
/// Base levels come from the onboarding questionnaire; session levels are
/// transient per-conversation overrides. All axes are 1–10.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleProfile {
    /// Owning user, when known.
    pub user_id: Option<String>,

    pub base_formality: Option<u8>,
    pub base_friendliness: Option<u8>,
    pub base_expressiveness: Option<u8>,
    pub base_directness: Option<u8>,

    pub session_formality: Option<u8>,
    pub session_friendliness: Option<u8>,
    pub session_expressiveness: Option<u8>,
    pub session_directness: Option<u8>,

    /// Stylistic avoidances.
    pub negative_preferences: NegativePreferences,

    /// Force-overrides routing: always escalate to the specialized pipeline.
    pub formal_document_mode: bool,
}

impl StyleProfile {
    /// Profile for a known user with all defaults.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    /// User id, or `"unknown"` for anonymous requests.
    pub fn user_id_or_unknown(&self) -> &str {
        self.user_id.as_deref().unwrap_or("unknown")
    }

    /// Formality as seen by the questionnaire/profile surface (default 5).
    pub fn effective_formality(&self) -> u8 {
        resolve_level(
            self.session_formality,
            self.base_formality,
            PROFILE_LEVEL_DEFAULT,
        )
    }

    /// Formality as seen by the routing decision (conservative fallback 3).
    pub fn routing_formality(&self) -> u8 {
        resolve_level(
            self.session_formality,
            self.base_formality,
            CONSERVATIVE_LEVEL_FALLBACK,
        )
    }

    pub fn effective_friendliness(&self) -> u8 {
        resolve_level(
            self.session_friendliness,
            self.base_friendliness,
            PROFILE_LEVEL_DEFAULT,
        )
    }

    pub fn effective_expressiveness(&self) -> u8 {
        resolve_level(
            self.session_expressiveness,
            self.base_expressiveness,
            PROFILE_LEVEL_DEFAULT,
        )
    }

    /// Directness as seen by the refinement-style selection (conservative
    /// fallback 3, i.e. neutral).
    pub fn style_directness(&self) -> u8 {
        resolve_level(
            self.session_directness,
            self.base_directness,
            CONSERVATIVE_LEVEL_FALLBACK,
        )
    }

    pub fn effective_directness(&self) -> u8 {
        resolve_level(
            self.session_directness,
            self.base_directness,
            PROFILE_LEVEL_DEFAULT,
        )
    }

    /// Copy of this profile with request-scoped negative-preference
    /// overrides folded in.
    pub fn with_negative_overrides(&self, overrides: Option<&NegativePreferences>) -> Self {
        let mut profile = self.clone();
        if let Some(overrides) = overrides {
            profile.negative_preferences = self.negative_preferences.merged_with(overrides);
        }
        profile
    }
}

/// Clamp a level adjustment to the 1–10 scale.
pub fn clamp_level(value: i16) -> u8 {
    value.clamp(1, 10) as u8
}
