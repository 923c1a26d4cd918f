//! Remote agent process reached over HTTP.

use super::{AgentResult, BridgeConfig, ToolAgent, ToolCallRecord};
use crate::error::{AgentError, QuillError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
struct RemoteRequest<'a> {
    instruction: &'a str,
    tools: &'a [String],
    max_steps: usize,
}

#[derive(Debug, Deserialize)]
struct RemoteResponse {
    success: bool,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    steps: Option<usize>,
    #[serde(default)]
    tool_calls: Vec<ToolCallRecord>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    budget_exhausted: bool,
}

/// Delegates instructions to an agent service at `config.endpoint`.
pub struct RemoteToolAgent {
    client: reqwest::Client,
    config: BridgeConfig,
}

impl RemoteToolAgent {
    pub fn new(config: BridgeConfig, timeout: Duration) -> Result<Self> {
        url::Url::parse(&config.endpoint).map_err(|e| {
            QuillError::Config(format!("Invalid agent endpoint '{}': {}", config.endpoint, e))
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuillError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ToolAgent for RemoteToolAgent {
    #[instrument(skip(self, instruction), fields(endpoint = %self.config.endpoint))]
    async fn execute(&self, instruction: &str) -> std::result::Result<AgentResult, AgentError> {
        let body = RemoteRequest {
            instruction,
            tools: &self.config.tools,
            max_steps: self.config.max_steps,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Unreachable(format!(
                "agent endpoint returned {}",
                status
            )));
        }

        let reply: RemoteResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Reported(format!("Malformed agent response: {}", e)))?;

        if !reply.success {
            if reply.budget_exhausted {
                return Err(AgentError::StepBudgetExceeded(
                    reply.steps.unwrap_or(self.config.max_steps),
                ));
            }
            return Err(AgentError::Reported(
                reply
                    .error
                    .unwrap_or_else(|| "agent reported failure".to_string()),
            ));
        }

        debug!("Remote agent finished in {:?} steps", reply.steps);
        Ok(AgentResult {
            output: reply.output.unwrap_or_default(),
            steps: reply.steps.unwrap_or(reply.tool_calls.len()),
            tool_calls: reply.tool_calls,
        })
    }

    fn config(&self) -> &BridgeConfig {
        &self.config
    }
}
