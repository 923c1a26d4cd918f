//! Tool agent bridge.
//!
//! Delegates a natural-language instruction to an agent that chooses and calls
//! CMS tools on its own, within a fixed step budget. The agent is pluggable:
//! an in-process tool-calling loop, a remote agent process, or an echo stub.
//! Backend mutations made by an agent are not transactional; a failed
//! instruction may leave partial changes behind.

mod echo;
mod remote;
mod runner;
mod tools;

pub use echo::EchoAgent;
pub use remote::RemoteToolAgent;
pub use runner::LocalToolAgent;
pub use tools::{parse_tool_call, tool_definitions, ToolCall, ToolContext, KNOWN_TOOLS};

use crate::backend::{ContentBackend, WordPressBackend};
use crate::config::{AgentMode, Prompts, Settings};
use crate::error::{AgentError, QuillError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Bridge configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeConfig {
    /// Where the agent lives (remote mode) or a descriptive label.
    pub endpoint: String,
    /// Tools the agent may use, de-duplicated, in first-seen order.
    pub tools: Vec<String>,
    /// Maximum reasoning/tool-call steps per instruction.
    pub max_steps: usize,
}

impl BridgeConfig {
    pub fn new<I, S>(endpoint: impl Into<String>, tools: I, max_steps: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered: Vec<String> = Vec::new();
        for tool in tools {
            let tool = tool.into();
            if !ordered.contains(&tool) {
                ordered.push(tool);
            }
        }
        Self {
            endpoint: endpoint.into(),
            tools: ordered,
            max_steps: max_steps.max(1),
        }
    }

    /// Whether the agent may call `tool`.
    pub fn allows(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t == tool)
    }
}

/// Terminal result of one instruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    /// The agent's final answer.
    pub output: String,
    /// Record of all tool calls made during execution.
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of steps (model calls) used.
    #[serde(default)]
    pub steps: usize,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

/// An agent that carries out natural-language instructions with CMS tools.
#[async_trait]
pub trait ToolAgent: Send + Sync {
    /// Run one instruction to completion.
    async fn execute(&self, instruction: &str) -> std::result::Result<AgentResult, AgentError>;

    /// The configuration this agent was built with.
    fn config(&self) -> &BridgeConfig;

    /// Maximum steps per instruction.
    fn max_steps(&self) -> usize {
        self.config().max_steps
    }
}

/// Build the configured agent.
pub fn from_settings(settings: &Settings, prompts: &Prompts) -> Result<Arc<dyn ToolAgent>> {
    let agent = &settings.agent;

    let agent: Arc<dyn ToolAgent> = match agent.mode {
        AgentMode::Local => {
            let backend: Arc<dyn ContentBackend> =
                Arc::new(WordPressBackend::from_settings(&settings.backend)?);
            let config = BridgeConfig::new(
                settings.backend.base_url.clone(),
                agent.tools.iter().cloned(),
                agent.max_steps,
            );
            let system_prompt = prompts.render_with_custom(&prompts.agent.system, &HashMap::new());
            Arc::new(
                LocalToolAgent::new(ToolContext::new(backend), &agent.model, config)?
                    .with_system_prompt(&system_prompt),
            )
        }
        AgentMode::Remote => {
            let config = BridgeConfig::new(
                agent.endpoint.clone(),
                agent.tools.iter().cloned(),
                agent.max_steps,
            );
            Arc::new(RemoteToolAgent::new(
                config,
                Duration::from_secs(agent.timeout_seconds),
            )?)
        }
        AgentMode::Echo => Arc::new(EchoAgent::new(BridgeConfig::new(
            "echo",
            agent.tools.iter().cloned(),
            agent.max_steps,
        ))),
    };

    info!(
        "Tool agent: {} ({} tools, max {} steps)",
        settings.agent.mode,
        agent.config().tools.len(),
        agent.config().max_steps
    );

    Ok(agent)
}

/// Validate that every configured tool name is one the local agent knows.
pub fn check_tool_names(tools: &[String]) -> Result<()> {
    for tool in tools {
        if !KNOWN_TOOLS.contains(&tool.as_str()) {
            return Err(QuillError::Config(format!(
                "Unknown agent tool '{}'. Known tools: {}",
                tool,
                KNOWN_TOOLS.join(", ")
            )));
        }
    }
    Ok(())
}
