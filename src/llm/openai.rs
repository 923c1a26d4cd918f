//! OpenAI chat completion implementation.

use super::{CompletionRequest, LanguageModel};
use crate::error::{QuillError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI-backed language model.
pub struct OpenAIModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
}

impl OpenAIModel {
    /// Create a model client using `OPENAI_API_KEY`.
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: create_client()?,
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAIModel {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(2);

        if let Some(system) = request.system {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(|e| QuillError::Generation(e.to_string()))?
                    .into(),
            );
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt)
                .build()
                .map_err(|e| QuillError::Generation(e.to_string()))?
                .into(),
        );

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&request.model)
            .messages(messages)
            .temperature(request.temperature)
            .build()
            .map_err(|e| QuillError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| QuillError::OpenAI(format!("Completion failed: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| QuillError::Generation("Empty response from LLM".to_string()))?
            .clone();

        debug!("Completion returned {} characters", content.chars().count());
        Ok(content)
    }
}
