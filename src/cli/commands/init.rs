//! Init command - interactive first-run setup.

use crate::backend::BackendCredentials;
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::io::{self, Write};
use std::path::Path;

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Quill Setup");
    println!();
    println!("Welcome to Quill! Let's make sure everything is configured correctly.\n");

    // Step 1: API key
    println!("{}", style("Step 1: Checking API configuration").bold().cyan());
    println!();

    if std::env::var("OPENAI_API_KEY").is_err() {
        Output::warning("OPENAI_API_KEY environment variable is not set.");
        println!();
        println!("  Quill requires an OpenAI API key for content generation and the local agent.");
        println!("  Get your API key from: {}", style("https://platform.openai.com/api-keys").underlined());
        println!();
        println!("  Set it in your shell configuration (~/.bashrc, ~/.zshrc, etc.):");
        println!("  {}", style("export OPENAI_API_KEY='sk-...'").green());
        println!();

        if !prompt_continue("Continue without API key?")? {
            println!();
            Output::info("Setup cancelled. Set your API key and run 'quill init' again.");
            return Ok(());
        }
    } else {
        Output::success("OpenAI API key is configured!");
    }

    println!();

    // Step 2: Backend credentials
    println!("{}", style("Step 2: Checking backend credentials").bold().cyan());
    println!();

    if BackendCredentials::from_settings(&settings.backend).is_none() {
        Output::warning("No backend credentials found.");
        println!();
        println!("  Publishing needs a WordPress user with an application password:");
        println!("  {}", style("export CMS_USERNAME='editor'").green());
        println!("  {}", style("export CMS_PASSWORD='xxxx xxxx xxxx xxxx'").green());
        println!();
    } else {
        Output::success(&format!("Backend credentials found for {}", settings.backend.base_url));
    }

    println!();

    // Step 3: Directories
    println!("{}", style("Step 3: Setting up directories").bold().cyan());
    println!();

    let data_dir = settings.data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        Output::success(&format!("Created data directory: {}", data_dir.display()));
    } else {
        Output::info(&format!("Data directory exists: {}", data_dir.display()));
    }

    println!();

    // Step 4: Config file
    println!("{}", style("Step 4: Configuration file").bold().cyan());
    println!();

    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        settings.save_to(&config_path.to_path_buf())?;
        Output::success(&format!("Created config file: {}", config_path.display()));
        println!();
        println!("  Edit your config with: {}", style("quill config edit").green());
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    if settings.site.homepage_id.is_none() {
        println!();
        println!(
            "  Set your homepage ID to enable homepage updates: {}",
            style("quill config set site.homepage_id <id>").green()
        );
    }

    println!();

    // Summary
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Check configuration", style("quill doctor").cyan());
    println!("  {} Draft content locally", style("quill generate \"<topic>\"").cyan());
    println!("  {} Publish a new page", style("quill create-page \"<title>\" \"<topic>\"").cyan());
    println!();
    println!("For more help: {}", style("quill --help").cyan());

    Ok(())
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
