//! Update-homepage command.

use crate::cli::preflight::{self, Operation};
use crate::cli::{read_content, Output};
use crate::config::Settings;
use crate::orchestrator::ContentOrchestrator;
use anyhow::Result;
use std::path::PathBuf;

/// Run the update-homepage command.
pub async fn run_update_homepage(
    content: Option<&str>,
    file: Option<&PathBuf>,
    settings: Settings,
) -> Result<()> {
    let content = read_content(content, file)?;
    preflight::check(Operation::Publish, &settings)?;

    let orchestrator = ContentOrchestrator::new(&settings)?;

    let spinner = Output::spinner("Updating homepage...");
    let outcome = orchestrator.update_homepage(&content).await;
    spinner.finish_and_clear();

    if !Output::outcome(&outcome, "Homepage updated") {
        anyhow::bail!("Homepage update failed");
    }
    Ok(())
}
