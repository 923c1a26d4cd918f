//! Optimize command - SEO pass over existing content.

use crate::cli::preflight::{self, Operation};
use crate::cli::{read_content, Output};
use crate::config::Settings;
use crate::orchestrator::ContentOrchestrator;
use anyhow::Result;
use std::path::PathBuf;

/// Run the optimize command. The optimized HTML goes to stdout.
pub async fn run_optimize(content: Option<&str>, file: Option<&PathBuf>, settings: Settings) -> Result<()> {
    let content = read_content(content, file)?;
    preflight::check(Operation::Generate, &settings)?;

    let orchestrator = ContentOrchestrator::new(&settings)?;

    let spinner = Output::spinner("Optimizing content...");
    let outcome = orchestrator.optimize_seo_content(&content).await;
    spinner.finish_and_clear();

    match (outcome.payload(), outcome.error()) {
        (Some(payload), _) => {
            println!("{}", payload["html"].as_str().unwrap_or_default());
            Ok(())
        }
        (None, error) => {
            Output::error(error.unwrap_or("optimization failed"));
            anyhow::bail!("Optimization failed")
        }
    }
}
