//! Page content generation.

use super::{generation_error, GeneratedContent, HtmlCleaner};
use crate::config::{LlmSettings, Prompts};
use crate::error::{QuillError, Result};
use crate::llm::{CompletionRequest, LanguageModel};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Generates page HTML for a topic with a single LLM call.
pub struct ContentGenerator {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
    settings: LlmSettings,
    cleaner: HtmlCleaner,
}

impl ContentGenerator {
    pub fn new(model: Arc<dyn LanguageModel>, prompts: Prompts, settings: LlmSettings) -> Self {
        Self {
            model,
            prompts,
            settings,
            cleaner: HtmlCleaner::new(),
        }
    }

    /// Build the completion request for a topic.
    pub fn build_request(&self, topic: &str) -> CompletionRequest {
        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), topic.to_string());

        let system = self
            .prompts
            .render_with_custom(&self.prompts.generation.system, &vars);
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.generation.user, &vars);

        CompletionRequest::new(prompt, &self.settings.model, self.settings.temperature)
            .with_system(system)
    }

    /// Generate HTML content about `topic`.
    #[instrument(skip(self), fields(topic = %topic))]
    pub async fn generate(&self, topic: &str) -> Result<GeneratedContent> {
        if topic.trim().is_empty() {
            return Err(QuillError::InvalidInput("Topic must not be empty".to_string()));
        }

        let request = self.build_request(topic.trim());
        let raw = self.model.complete(request).await.map_err(generation_error)?;
        let content = self.cleaner.finish(&raw)?;

        info!("Generated {} characters of content", content.length);
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingModel, StubModel};

    fn generator(model: Arc<dyn LanguageModel>) -> ContentGenerator {
        let mut prompts = Prompts::default();
        prompts
            .variables
            .insert("industry".to_string(), "tax consulting".to_string());
        ContentGenerator::new(model, prompts, LlmSettings::default())
    }

    #[tokio::test]
    async fn test_generate_returns_content() {
        let model = Arc::new(StubModel::new("<p>stub</p>"));
        let content = generator(model.clone()).generate("Q4 Tax Planning").await.unwrap();

        assert_eq!(content.html, "<p>stub</p>");
        assert_eq!(content.length, 11);
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_prompt_embeds_topic_and_parameters() {
        let model = Arc::new(StubModel::new("<p>ok</p>"));
        generator(model.clone()).generate("VAT refunds").await.unwrap();

        let request = model.last_request().unwrap();
        assert!(request.prompt.contains("VAT refunds"));
        assert!(request.prompt.contains("tax consulting"));
        assert!(request.prompt.contains("800-1200 words"));
        assert_eq!(request.model, "gpt-4o");
        assert!((request.temperature - 0.7).abs() < f32::EPSILON);
        assert!(request.system.is_some());
    }

    #[tokio::test]
    async fn test_empty_completion_is_generation_error() {
        let model = Arc::new(StubModel::new("  \n "));
        let err = generator(model).generate("Anything").await.unwrap_err();
        assert!(matches!(err, QuillError::Generation(_)));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_generation_error() {
        let err = generator(Arc::new(FailingModel::new("rate limited")))
            .generate("Anything")
            .await
            .unwrap_err();
        assert!(matches!(err, QuillError::Generation(ref m) if m.contains("rate limited")));
    }

    #[tokio::test]
    async fn test_blank_topic_skips_llm() {
        let model = Arc::new(StubModel::new("<p>never</p>"));
        let err = generator(model.clone()).generate("   ").await.unwrap_err();
        assert!(matches!(err, QuillError::InvalidInput(_)));
        assert_eq!(model.calls(), 0);
    }
}
