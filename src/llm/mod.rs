//! Language model abstraction for content generation.

mod openai;

pub use openai::OpenAIModel;

use crate::error::Result;
use async_trait::async_trait;

/// A single completion request: prompt plus sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Optional system message.
    pub system: Option<String>,
    /// The user prompt.
    pub prompt: String,
    /// Model to use.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

impl CompletionRequest {
    /// Create a request with no system message.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            model: model.into(),
            temperature,
        }
    }

    /// Attach a system message.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Trait for LLM text completion.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run one completion and return the generated text.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}
