//! Generate command - content generation without publishing.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::content::{ContentGenerator, SeoOptimizer};
use crate::llm::{LanguageModel, OpenAIModel};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Run the generate command.
pub async fn run_generate(
    topic: &str,
    seo: bool,
    output: Option<PathBuf>,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Generate, &settings)?;

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let model: Arc<dyn LanguageModel> = Arc::new(OpenAIModel::new()?);

    let spinner = Output::spinner(&format!("Generating content about '{}'...", topic));
    let generator = ContentGenerator::new(model.clone(), prompts.clone(), settings.llm.clone());
    let mut content = match generator.generate(topic).await {
        Ok(content) => content,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };

    if seo {
        spinner.set_message("Optimizing for SEO...");
        let optimizer = SeoOptimizer::new(model, prompts, settings.llm.clone());
        content = match optimizer.optimize(&content.html).await {
            Ok(content) => content,
            Err(e) => {
                spinner.finish_and_clear();
                return Err(e.into());
            }
        };
    }
    spinner.finish_and_clear();

    match output {
        Some(path) => {
            std::fs::write(&path, &content.html)?;
            Output::success(&format!(
                "Wrote {} characters to {}",
                content.length,
                path.display()
            ));
        }
        None => println!("{}", content.html),
    }

    Ok(())
}
