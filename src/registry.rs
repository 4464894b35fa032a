//! Service registry.
//!
//! All services are constructed once at process start and handed around by
//! reference; there are no module-level singletons and no hidden
//! re-creation. The one-time specialized-endpoint health probe happens
//! here, during bootstrap.

use std::sync::Arc;

use crate::config::Settings;
use crate::conversion::StyleConverter;
use crate::feedback::FeedbackRouter;
use crate::llm::{LanguageModel, OpenAiChatClient};
use crate::pipeline::ConversionPipeline;
use crate::preferences::{InMemoryPreferenceStore, PreferenceStore};
use crate::prompts::{PromptTemplates, StylePromptBuilder};
use crate::rag::RagEngine;
use crate::retrieval::{DocumentIndex, InMemoryIndex};
use crate::types::Capability;

/// The wired service graph, built once at startup.
pub struct ServiceRegistry {
    pub settings: Settings,
    pub llm: Arc<dyn LanguageModel>,
    pub prompts: Arc<dyn PromptTemplates>,
    pub converter: Arc<StyleConverter>,
    pub pipeline: Arc<ConversionPipeline>,
    pub index: Arc<dyn DocumentIndex>,
    pub rag: Arc<RagEngine>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub feedback: Arc<FeedbackRouter>,
}

impl ServiceRegistry {
    /// Build the full service graph, probing the specialized endpoint once.
    pub async fn bootstrap(settings: Settings) -> anyhow::Result<Self> {
        let prompts: Arc<dyn PromptTemplates> = Arc::new(StylePromptBuilder::new()?);
        let llm: Arc<dyn LanguageModel> = Arc::new(OpenAiChatClient::new(
            settings.model.clone(),
            settings.openai_api_key.clone(),
            settings.openai_base_url.clone(),
            settings.temperature,
        ));

        let index: Arc<dyn DocumentIndex> = match &settings.documents_dir {
            Some(dir) => Arc::new(InMemoryIndex::load_dir(std::path::Path::new(dir))?),
            None => {
                tracing::warn!("no documents directory configured; index starts empty");
                Arc::new(InMemoryIndex::empty())
            }
        };

        let pipeline =
            ConversionPipeline::connect(&settings, llm.clone(), prompts.clone()).await;

        Ok(Self::from_parts(
            settings,
            llm,
            prompts,
            Arc::new(pipeline),
            index,
        ))
    }

    /// Wire the remaining services around already-built leaves. Used by
    /// bootstrap and by tests that skip the health probe.
    pub fn from_parts(
        settings: Settings,
        llm: Arc<dyn LanguageModel>,
        prompts: Arc<dyn PromptTemplates>,
        pipeline: Arc<ConversionPipeline>,
        index: Arc<dyn DocumentIndex>,
    ) -> Self {
        let converter = Arc::new(StyleConverter::new(llm.clone(), prompts.clone()));
        let preferences: Arc<dyn PreferenceStore> = Arc::new(InMemoryPreferenceStore::new());
        let rag = Arc::new(RagEngine::new(
            index.clone(),
            converter.clone(),
            llm.clone(),
            prompts.clone(),
        ));
        let feedback = Arc::new(FeedbackRouter::new(
            Capability::Available(preferences.clone()),
            Capability::Available(converter.clone()),
        ));

        Self {
            settings,
            llm,
            prompts,
            converter,
            pipeline,
            index,
            rag,
            preferences,
            feedback,
        }
    }
}
