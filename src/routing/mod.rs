//! Style decision engine.
//!
//! Pure routing logic deciding whether a request escalates to the
//! specialized two-stage pipeline or stays on the general-purpose model.
//! No I/O, no side effects; the precedence order is fixed and the first
//! matching rule wins.

use serde::{Deserialize, Serialize};

use crate::profile::StyleProfile;
use crate::types::ContextLabel;

/// Formality at or above this level always escalates.
const ESCALATE_FORMALITY: u8 = 5;

/// Formality at or above this level escalates in formal contexts
/// (business / report).
const CONTEXTUAL_FORMALITY: u8 = 4;

/// Why a routing decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionReason {
    /// The caller explicitly requested conversion.
    UserExplicitRequest,
    /// A profile/context condition triggered automatic escalation.
    AutoCondition,
    /// No condition matched; the request stays on the general model.
    ConditionNotMet,
}

impl ConversionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserExplicitRequest => "user_explicit_request",
            Self::AutoCondition => "auto_condition",
            Self::ConditionNotMet => "condition_not_met",
        }
    }
}

/// Outcome of the style decision engine. Derived per request, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Escalate to the specialized two-stage pipeline.
    pub escalate: bool,
    pub reason: ConversionReason,
}

impl RoutingDecision {
    fn escalated(reason: ConversionReason) -> Self {
        Self {
            escalate: true,
            reason,
        }
    }

    fn declined() -> Self {
        Self {
            escalate: false,
            reason: ConversionReason::ConditionNotMet,
        }
    }
}

/// Decide whether to escalate a request to the specialized pipeline.
///
/// Precedence, first match wins:
/// 1. `force_convert` — unconditional, bypasses all profile inspection.
/// 2. `formal_document_mode` on the profile.
/// 3. Effective formality (session, else base, else the conservative
///    fallback of 3) at or above 5.
/// 4. Effective formality at or above 4 in a business or report context.
/// 5. Otherwise: no escalation.
pub fn decide(
    profile: &StyleProfile,
    context: &ContextLabel,
    force_convert: bool,
) -> RoutingDecision {
    if force_convert {
        return RoutingDecision::escalated(ConversionReason::UserExplicitRequest);
    }

    if profile.formal_document_mode {
        return RoutingDecision::escalated(ConversionReason::AutoCondition);
    }

    let formality = profile.routing_formality();
    if formality >= ESCALATE_FORMALITY {
        return RoutingDecision::escalated(ConversionReason::AutoCondition);
    }

    if formality >= CONTEXTUAL_FORMALITY && context.is_formal() {
        return RoutingDecision::escalated(ConversionReason::AutoCondition);
    }

    RoutingDecision::declined()
}
