//! Create-page command - generate and publish through the agent.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::content::ContentRequest;
use crate::orchestrator::ContentOrchestrator;
use anyhow::Result;

/// Run the create-page command.
pub async fn run_create_page(title: &str, topic: &str, seo: bool, settings: Settings) -> Result<()> {
    preflight::check(Operation::Publish, &settings)?;

    let orchestrator = ContentOrchestrator::new(&settings)?;

    let spinner = Output::spinner(&format!("Creating page '{}'...", title));
    let outcome = orchestrator
        .create_page_with(ContentRequest::new(title, topic), seo)
        .await;
    spinner.finish_and_clear();

    if !Output::outcome(&outcome, &format!("Page '{}' created", title)) {
        anyhow::bail!("Page creation failed");
    }
    Ok(())
}
