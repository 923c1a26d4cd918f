//! Status command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::ContentOrchestrator;
use anyhow::Result;

/// Run the status command.
pub async fn run_status(settings: Settings) -> Result<()> {
    preflight::check(Operation::Status, &settings)?;

    let orchestrator = ContentOrchestrator::new(&settings)?;

    let spinner = Output::spinner("Asking the agent...");
    let snapshot = orchestrator.get_agent_status().await;
    spinner.finish_and_clear();

    Output::header("Agent Status");
    Output::status(&snapshot);
    Ok(())
}
