//! Retrieval-augmented style generation.
//!
//! Fetches the most relevant passages for a query, assembles them into a
//! grounding block, and either answers directly (single-answer mode) or fans
//! out into the three style variants. Grounding is mandatory: a missing
//! index or an empty retrieval is terminal for the request, never silently
//! replaced by ungrounded generation.

use std::sync::Arc;

use crate::conversion::StyleConverter;
use crate::llm::LanguageModel;
use crate::profile::StyleProfile;
use crate::prompts::PromptTemplates;
use crate::retrieval::{DocumentIndex, IndexStatus, RetrievedPassage};
use crate::types::{ContextLabel, ConversionResult, GenerationMethod, SourceCitation};

/// Passages fetched per query.
const RETRIEVAL_K: usize = 5;

/// Citation previews are clipped to this many characters. Only the display
/// preview is clipped; generation sees the full passage.
const CITATION_PREVIEW_CHARS: usize = 100;

/// The grounding-context preview attached to results is clipped to this
/// many characters.
const CONTEXT_PREVIEW_CHARS: usize = 300;

/// Char-boundary-safe truncation with an ellipsis marker.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

/// Retrieval-augmented generator over a document index.
pub struct RagEngine {
    index: Arc<dyn DocumentIndex>,
    converter: Arc<StyleConverter>,
    llm: Arc<dyn LanguageModel>,
    prompts: Arc<dyn PromptTemplates>,
}

impl RagEngine {
    pub fn new(
        index: Arc<dyn DocumentIndex>,
        converter: Arc<StyleConverter>,
        llm: Arc<dyn LanguageModel>,
        prompts: Arc<dyn PromptTemplates>,
    ) -> Self {
        Self {
            index,
            converter,
            llm,
            prompts,
        }
    }

    pub fn status(&self) -> IndexStatus {
        self.index.status()
    }

    /// Answer a question from indexed documents, one plain answer.
    ///
    /// Optional free-text `context` is prepended to the query when present.
    pub async fn ask(&self, query: &str, context: Option<&str>) -> ConversionResult {
        if !self.index.status().ready {
            return ConversionResult::failed(
                GenerationMethod::RagAnswer,
                "document index is not initialized",
            );
        }

        let enhanced_query = match context.map(str::trim) {
            Some(ctx) if !ctx.is_empty() => format!("Context: {ctx}\n\nQuestion: {query}"),
            _ => query.to_string(),
        };

        let passages = match self.index.retrieve(&enhanced_query, RETRIEVAL_K).await {
            Ok(passages) => passages,
            Err(e) => {
                tracing::error!(error = %e, "retrieval failed");
                return ConversionResult::failed(
                    GenerationMethod::Error,
                    format!("retrieval failed: {e}"),
                );
            }
        };
        if passages.is_empty() {
            return ConversionResult::failed(
                GenerationMethod::RagAnswer,
                "no related documents found",
            );
        }

        let (grounding, sources) = assemble_grounding(&passages);
        let prompt = match self.prompts.rag_answer_prompt(&enhanced_query, &grounding) {
            Ok(prompt) => prompt,
            Err(e) => {
                return ConversionResult::failed(
                    GenerationMethod::Error,
                    format!("prompt rendering failed: {e}"),
                );
            }
        };

        match self.llm.generate(&prompt).await {
            Ok(answer) => ConversionResult::answered(answer, self.model_tag())
                .with_sources(sources)
                .with_documents_retrieved(passages.len()),
            Err(e) => {
                tracing::error!(error = %e, "grounded answer generation failed");
                ConversionResult::failed(
                    GenerationMethod::Error,
                    format!("answer generation failed: {e}"),
                )
            }
        }
    }

    /// Answer a question from indexed documents in all three style variants.
    pub async fn ask_with_styles(
        &self,
        query: &str,
        profile: &StyleProfile,
        context: &ContextLabel,
    ) -> ConversionResult {
        if !self.index.status().ready {
            return ConversionResult::failed(
                GenerationMethod::ThreeStyle,
                "document index is not initialized",
            );
        }

        let passages = match self.index.retrieve(query, RETRIEVAL_K).await {
            Ok(passages) => passages,
            Err(e) => {
                tracing::error!(error = %e, "retrieval failed");
                return ConversionResult::failed(
                    GenerationMethod::Error,
                    format!("retrieval failed: {e}"),
                );
            }
        };
        if passages.is_empty() {
            return ConversionResult::failed(
                GenerationMethod::ThreeStyle,
                "no related documents found",
            );
        }

        let (grounding, sources) = assemble_grounding(&passages);
        let enhanced_input = format!("Question: {query}\n\nReference Documents:\n{grounding}");

        let result = self
            .converter
            .convert_text(&enhanced_input, profile, context)
            .await;
        if !result.success {
            return result;
        }

        let mut result = result
            .with_sources(sources)
            .with_rag_context(truncate_chars(&grounding, CONTEXT_PREVIEW_CHARS))
            .with_documents_retrieved(passages.len());
        result.metadata.model_used = self.model_tag();
        result
    }

    fn model_tag(&self) -> String {
        format!("{} + document-index", self.llm.model())
    }
}

/// Join passages into a labeled grounding block and build citations.
fn assemble_grounding(passages: &[RetrievedPassage]) -> (String, Vec<SourceCitation>) {
    let mut parts = Vec::with_capacity(passages.len());
    let mut sources = Vec::with_capacity(passages.len());

    for passage in passages {
        parts.push(format!(
            "[Reference Document {}] ({}):\n{}",
            passage.rank, passage.source, passage.content
        ));
        sources.push(SourceCitation {
            rank: passage.rank,
            source: passage.source.clone(),
            preview: truncate_chars(&passage.content, CITATION_PREVIEW_CHARS),
        });
    }

    (parts.join("\n\n"), sources)
}
