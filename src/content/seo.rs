//! SEO optimization of existing content.

use super::{generation_error, GeneratedContent, HtmlCleaner};
use crate::config::{LlmSettings, Prompts};
use crate::error::Result;
use crate::llm::{CompletionRequest, LanguageModel};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Rewrites content for search engines with a single LLM call.
///
/// The input is treated as opaque text; its structure is not validated.
pub struct SeoOptimizer {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
    settings: LlmSettings,
    cleaner: HtmlCleaner,
}

impl SeoOptimizer {
    pub fn new(model: Arc<dyn LanguageModel>, prompts: Prompts, settings: LlmSettings) -> Self {
        Self {
            model,
            prompts,
            settings,
            cleaner: HtmlCleaner::new(),
        }
    }

    /// Optimize `content` and return the rewritten HTML.
    #[instrument(skip(self, content), fields(input_len = content.len()))]
    pub async fn optimize(&self, content: &str) -> Result<GeneratedContent> {
        let mut vars = HashMap::new();
        vars.insert("content".to_string(), content.to_string());

        let system = self.prompts.render_with_custom(&self.prompts.seo.system, &vars);
        let prompt = self.prompts.render_with_custom(&self.prompts.seo.user, &vars);
        let request = CompletionRequest::new(prompt, &self.settings.model, self.settings.temperature)
            .with_system(system);

        let raw = self.model.complete(request).await.map_err(generation_error)?;
        let optimized = self.cleaner.finish(&raw)?;

        info!("Optimized content: {} characters", optimized.length);
        Ok(optimized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuillError;
    use crate::testing::{FailingModel, StubModel};

    #[tokio::test]
    async fn test_optimize_embeds_content() {
        let model = Arc::new(StubModel::new("```html\n<h2>Better</h2>\n```"));
        let optimizer = SeoOptimizer::new(model.clone(), Prompts::default(), LlmSettings::default());

        let optimized = optimizer.optimize("<h3>Original</h3>").await.unwrap();
        assert_eq!(optimized.html, "<h2>Better</h2>");
        assert!(!optimized.html.is_empty());

        let request = model.last_request().unwrap();
        assert!(request.prompt.contains("<h3>Original</h3>"));
        assert!(request.prompt.contains("internal linking"));
    }

    #[tokio::test]
    async fn test_optimize_accepts_unstructured_input() {
        let model = Arc::new(StubModel::new("<p>fine</p>"));
        let optimizer = SeoOptimizer::new(model, Prompts::default(), LlmSettings::default());
        assert!(optimizer.optimize("not html at all {{").await.is_ok());
    }

    #[tokio::test]
    async fn test_optimize_failure() {
        let optimizer = SeoOptimizer::new(
            Arc::new(FailingModel::new("boom")),
            Prompts::default(),
            LlmSettings::default(),
        );
        let err = optimizer.optimize("<p>x</p>").await.unwrap_err();
        assert!(matches!(err, QuillError::Generation(_)));
    }
}
