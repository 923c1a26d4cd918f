//! Dry-run agent that performs no backend calls.

use super::{AgentResult, BridgeConfig, ToolAgent};
use crate::error::AgentError;
use async_trait::async_trait;
use tracing::info;

/// Succeeds with the instruction echoed back.
pub struct EchoAgent {
    config: BridgeConfig,
}

impl EchoAgent {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ToolAgent for EchoAgent {
    async fn execute(&self, instruction: &str) -> std::result::Result<AgentResult, AgentError> {
        info!("Dry run, not executing: {}", instruction);
        Ok(AgentResult {
            output: format!("[dry-run] {}", instruction),
            tool_calls: Vec::new(),
            steps: 0,
        })
    }

    fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echoes_instruction() {
        let agent = EchoAgent::new(BridgeConfig::new("echo", ["get_pages"], 10));
        let result = agent.execute("Get count of all pages").await.unwrap();
        assert_eq!(result.output, "[dry-run] Get count of all pages");
        assert_eq!(result.steps, 0);
    }
}
