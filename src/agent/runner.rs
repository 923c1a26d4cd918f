//! Local agent runner with tool calling loop.

use super::tools::{parse_tool_call, tool_definitions, ToolContext};
use super::{AgentResult, BridgeConfig, ToolAgent, ToolCallRecord};
use crate::error::{AgentError, Result};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

/// Default system prompt for the agent.
const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a website management assistant with access to a WordPress site.

You have tools to list pages, create pages, update pages and upload media.
Think step-by-step about what you need to do, then use the appropriate tools.

Guidelines:
- Use 'get_pages' first if you need to find a page ID
- Use 'create_page' with the HTML content exactly as given
- Use 'update_page' only with a page ID you have confirmed exists
- Do not invent content that was not provided

When the task is done, reply with a short summary of what changed, including page IDs."#;

/// Agent that runs an OpenAI tool-calling loop in-process.
pub struct LocalToolAgent {
    client: Client<OpenAIConfig>,
    model: String,
    tools: ToolContext,
    config: BridgeConfig,
    system_prompt: String,
}

impl LocalToolAgent {
    /// Create a new agent with the given tool context and model.
    pub fn new(tools: ToolContext, model: &str, config: BridgeConfig) -> Result<Self> {
        Ok(Self::with_client(create_client()?, tools, model, config))
    }

    /// Create an agent on top of an existing OpenAI client.
    pub fn with_client(
        client: Client<OpenAIConfig>,
        tools: ToolContext,
        model: &str,
        config: BridgeConfig,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            tools,
            config,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Set a custom system prompt. Blank prompts keep the default.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        if !prompt.trim().is_empty() {
            self.system_prompt = prompt.to_string();
        }
        self
    }

    /// Execute a single tool call and return a record of it.
    ///
    /// Tool failures become the record's result text so the model can react.
    async fn execute_tool_call(
        &self,
        tool_call: &ChatCompletionMessageToolCall,
    ) -> std::result::Result<ToolCallRecord, AgentError> {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        if !self.config.allows(name) {
            warn!("Agent requested tool outside its allowed set: {}", name);
            return Err(AgentError::ToolNotAllowed(name.clone()));
        }

        info!("Agent calling tool: {} with args: {}", name, arguments);

        let result = match parse_tool_call(name, arguments) {
            Ok(tool) => match self.tools.execute(&tool).await {
                Ok(output) => output,
                Err(e) => format!("Tool error: {}", e),
            },
            Err(e) => format!("Failed to parse tool call: {}", e),
        };

        Ok(ToolCallRecord {
            name: name.clone(),
            arguments: arguments.clone(),
            result,
        })
    }
}

fn build_error(e: impl std::fmt::Display) -> AgentError {
    AgentError::ToolFailed(format!("Failed to build model request: {}", e))
}

#[async_trait]
impl ToolAgent for LocalToolAgent {
    #[instrument(skip(self, instruction), fields(max_steps = self.config.max_steps))]
    async fn execute(&self, instruction: &str) -> std::result::Result<AgentResult, AgentError> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_prompt.clone())
                .build()
                .map_err(build_error)?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(instruction.to_string())
                .build()
                .map_err(build_error)?
                .into(),
        ];

        let definitions = tool_definitions(&self.config.tools);
        let mut tool_calls_made = Vec::new();

        for step in 1..=self.config.max_steps {
            debug!("Agent step {}", step);

            let mut args = CreateChatCompletionRequestArgs::default();
            args.model(&self.model).messages(messages.clone());
            if !definitions.is_empty() {
                args.tools(definitions.clone());
            }
            let request = args.build().map_err(build_error)?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .map_err(|e| AgentError::Unreachable(format!("model API error: {}", e)))?;

            let choice = response
                .choices
                .first()
                .ok_or_else(|| AgentError::Reported("No response from model".to_string()))?;

            let tool_calls = match choice.message.tool_calls {
                Some(ref calls) if !calls.is_empty() => calls,
                _ => {
                    return Ok(AgentResult {
                        output: choice.message.content.clone().unwrap_or_default(),
                        tool_calls: tool_calls_made,
                        steps: step,
                    });
                }
            };

            messages.push(
                ChatCompletionRequestAssistantMessageArgs::default()
                    .tool_calls(tool_calls.clone())
                    .build()
                    .map_err(build_error)?
                    .into(),
            );

            for tool_call in tool_calls {
                let record = self.execute_tool_call(tool_call).await?;

                messages.push(
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(&tool_call.id)
                        .content(record.result.clone())
                        .build()
                        .map_err(build_error)?
                        .into(),
                );

                tool_calls_made.push(record);
            }
        }

        warn!(
            "Agent used all {} steps after {} tool calls",
            self.config.max_steps,
            tool_calls_made.len()
        );
        Err(AgentError::StepBudgetExceeded(self.config.max_steps))
    }

    fn config(&self) -> &BridgeConfig {
        &self.config
    }
}
