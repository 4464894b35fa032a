//! Prompt template service.
//!
//! Produces style-specific instruction strings from a profile, context, and
//! negative preferences, and renders the fixed refinement / grounded-answer
//! templates. Pure string work; no generation happens here.

use std::collections::BTreeMap;

use tera::Tera;

use crate::error::OrchestrationError;
use crate::profile::StyleProfile;
use crate::types::{ContextLabel, StyleVariant};

const REFINEMENT_TEMPLATE: &str = "\
This is a formal document conversion task.

[Original Text]
{{ original }}

[Primary Conversion Result]
{{ primary }}

[Task Instructions]
{{ instruction }}

Refine the primary conversion result into a more natural and polished formal
document while maintaining the original intent, referencing both the original
text and the primary conversion result.

- Preserve the core meaning and context of the original text
- Maintain the formal tone of the primary conversion but improve unnatural parts
- Supplement any missing information by referencing the original
";

const RAG_ANSWER_TEMPLATE: &str = "\
Answer the question based on the following document content.

Documents:
{{ grounding }}

Question: {{ question }}

Answer:
";

/// Style-specific instruction strings and fixed templates for the
/// generation pipelines.
pub trait PromptTemplates: Send + Sync {
    /// One instruction string per style variant, derived from the profile's
    /// effective levels, the context, and the negative preferences.
    fn style_instructions(
        &self,
        profile: &StyleProfile,
        context: &ContextLabel,
    ) -> BTreeMap<StyleVariant, String>;

    /// Refinement prompt embedding the original text, the primary-stage
    /// output, and one style instruction.
    fn refinement_prompt(
        &self,
        original: &str,
        primary: &str,
        instruction: &str,
    ) -> Result<String, OrchestrationError>;

    /// Single-answer prompt over a grounding block.
    fn rag_answer_prompt(
        &self,
        question: &str,
        grounding: &str,
    ) -> Result<String, OrchestrationError>;
}

/// Default template service backed by tera.
pub struct StylePromptBuilder {
    tera: Tera,
}

impl StylePromptBuilder {
    pub fn new() -> Result<Self, OrchestrationError> {
        let mut tera = Tera::default();
        tera.add_raw_template("refinement", REFINEMENT_TEMPLATE)?;
        tera.add_raw_template("rag_answer", RAG_ANSWER_TEMPLATE)?;
        Ok(Self { tera })
    }

    fn tone_directive(variant: StyleVariant) -> &'static str {
        match variant {
            StyleVariant::Direct => {
                "Lead with the main point and keep sentences short and assertive."
            }
            StyleVariant::Gentle => {
                "Soften requests, hedge considerately, and keep a warm, accommodating tone."
            }
            StyleVariant::Neutral => {
                "Keep an even, matter-of-fact tone without pushing in either direction."
            }
        }
    }

    fn level_descriptions(profile: &StyleProfile) -> Vec<String> {
        let mut out = Vec::new();

        let formality = profile.effective_formality();
        out.push(match formality {
            7..=10 => "Use a highly formal, honorific register.".to_string(),
            4..=6 => "Write politely and professionally.".to_string(),
            _ => "Keep the register relaxed and conversational.".to_string(),
        });

        let friendliness = profile.effective_friendliness();
        if friendliness >= 7 {
            out.push("Sound warm and approachable.".to_string());
        } else if friendliness <= 3 {
            out.push("Stay reserved and businesslike.".to_string());
        }

        let expressiveness = profile.effective_expressiveness();
        if expressiveness >= 7 {
            out.push("Emotional coloring is welcome where it fits.".to_string());
        } else if expressiveness <= 3 {
            out.push("Keep emotional expression restrained.".to_string());
        }

        out
    }
}

impl PromptTemplates for StylePromptBuilder {
    fn style_instructions(
        &self,
        profile: &StyleProfile,
        context: &ContextLabel,
    ) -> BTreeMap<StyleVariant, String> {
        let mut instructions = BTreeMap::new();
        let levels = Self::level_descriptions(profile);
        let avoidances = profile.negative_preferences.active();

        for variant in StyleVariant::ALL {
            let mut instruction = format!(
                "Rewrite the message for a {} context in a {} tone.\n",
                context, variant
            );
            instruction.push_str(Self::tone_directive(variant));
            instruction.push('\n');
            for line in &levels {
                instruction.push_str(line);
                instruction.push('\n');
            }
            for (subject, strictness) in &avoidances {
                instruction.push_str(&format!("{} {}.\n", strictness.directive(), subject));
            }
            instructions.insert(variant, instruction);
        }

        instructions
    }

    fn refinement_prompt(
        &self,
        original: &str,
        primary: &str,
        instruction: &str,
    ) -> Result<String, OrchestrationError> {
        let mut ctx = tera::Context::new();
        ctx.insert("original", original);
        ctx.insert("primary", primary);
        ctx.insert("instruction", instruction);
        Ok(self.tera.render("refinement", &ctx)?)
    }

    fn rag_answer_prompt(
        &self,
        question: &str,
        grounding: &str,
    ) -> Result<String, OrchestrationError> {
        let mut ctx = tera::Context::new();
        ctx.insert("question", question);
        ctx.insert("grounding", grounding);
        Ok(self.tera.render("rag_answer", &ctx)?)
    }
}
