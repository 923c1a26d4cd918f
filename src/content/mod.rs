//! LLM-based page content generation and SEO post-processing.

mod generator;
mod seo;

pub use generator::ContentGenerator;
pub use seo::SeoOptimizer;

use crate::error::QuillError;
use regex::Regex;
use serde::Serialize;

/// What the caller wants a page about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    /// Subject the content is generated from.
    pub topic: String,
    /// Title of the page that will be created.
    pub target_title: String,
}

impl ContentRequest {
    pub fn new(target_title: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            target_title: target_title.into(),
        }
    }
}

/// HTML produced by one LLM call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedContent {
    pub html: String,
    /// Length of `html` in characters.
    pub length: usize,
}

impl GeneratedContent {
    pub fn new(html: String) -> Self {
        let length = html.chars().count();
        Self { html, length }
    }
}

/// Normalizes raw model output into page HTML.
struct HtmlCleaner {
    fence: Regex,
}

impl HtmlCleaner {
    fn new() -> Self {
        // A whole response wrapped in a Markdown code fence, e.g. ```html ... ```
        let fence = Regex::new(r"(?s)^\s*```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n?```\s*$")
            .expect("Invalid regex");
        Self { fence }
    }

    /// Strip a surrounding code fence and outer whitespace.
    fn clean(&self, raw: &str) -> String {
        match self.fence.captures(raw) {
            Some(caps) => caps
                .get(1)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
            None => raw.trim().to_string(),
        }
    }

    /// Clean a completion, rejecting empty output.
    fn finish(&self, raw: &str) -> crate::Result<GeneratedContent> {
        let html = self.clean(raw);
        if html.is_empty() {
            return Err(QuillError::Generation(
                "LLM returned empty content".to_string(),
            ));
        }
        Ok(GeneratedContent::new(html))
    }
}

/// Fold any upstream failure into a generation error.
fn generation_error(err: QuillError) -> QuillError {
    match err {
        QuillError::Generation(_) => err,
        other => QuillError::Generation(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_counts_characters() {
        let content = GeneratedContent::new("<p>stub</p>".to_string());
        assert_eq!(content.length, 11);

        let content = GeneratedContent::new("<p>מס</p>".to_string());
        assert_eq!(content.length, 9);
    }

    #[test]
    fn test_cleaner_strips_code_fence() {
        let cleaner = HtmlCleaner::new();
        assert_eq!(cleaner.clean("```html\n<h1>Hi</h1>\n```"), "<h1>Hi</h1>");
        assert_eq!(cleaner.clean("```\n<p>x</p>\n```\n"), "<p>x</p>");
        assert_eq!(cleaner.clean("  <p>plain</p>\n"), "<p>plain</p>");
    }

    #[test]
    fn test_cleaner_keeps_inner_fences() {
        let cleaner = HtmlCleaner::new();
        let raw = "<p>Use:</p>\n```\ncode\n```\n<p>done</p>";
        assert_eq!(cleaner.clean(raw), raw);
    }

    #[test]
    fn test_finish_rejects_empty() {
        let cleaner = HtmlCleaner::new();
        assert!(matches!(
            cleaner.finish("```html\n\n```"),
            Err(QuillError::Generation(_))
        ));
        assert!(matches!(cleaner.finish("   "), Err(QuillError::Generation(_))));
    }
}
