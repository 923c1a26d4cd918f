//! Quill CLI entry point.

use anyhow::Result;
use clap::Parser;
use quill::cli::{commands, Cli, Commands};
use quill::config::Settings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging. Stdout carries the MCP protocol, so logs go to stderr.
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("quill={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Load configuration
    let config_path = cli
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    // Ensure the data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Init => {
            commands::run_init(&settings, &config_path)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path)?;
        }

        Commands::Generate { topic, seo, output } => {
            commands::run_generate(topic, *seo, output.clone(), settings).await?;
        }

        Commands::CreatePage { title, topic, seo } => {
            commands::run_create_page(title, topic, *seo, settings).await?;
        }

        Commands::UpdateHomepage { content, file } => {
            commands::run_update_homepage(content.as_deref(), file.as_ref(), settings).await?;
        }

        Commands::Optimize { content, file } => {
            commands::run_optimize(content.as_deref(), file.as_ref(), settings).await?;
        }

        Commands::Status => {
            commands::run_status(settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Mcp => {
            commands::run_mcp(settings).await?;
        }

        Commands::Preview { dir, start_port } => {
            commands::run_preview(dir.clone(), *start_port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, config_path)?;
        }
    }

    Ok(())
}
