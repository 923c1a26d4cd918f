//! Preview command - local static file server.

use crate::cli::Output;
use crate::config::Settings;
use crate::preview::Preview;
use anyhow::Result;
use std::path::PathBuf;

/// Run the preview server until Ctrl+C.
pub async fn run_preview(dir: Option<PathBuf>, start_port: Option<u16>, settings: Settings) -> Result<()> {
    let directory = dir.unwrap_or_else(|| settings.preview_dir());
    let start_port = start_port.unwrap_or(settings.preview.start_port);
    let host = settings.server.host.as_str();

    let preview = Preview::bind(&directory, host, start_port, settings.preview.max_attempts).await?;
    let base = format!("http://{}:{}", host, preview.port());

    Output::header("Quill Preview");
    println!();
    if preview.port() != start_port {
        Output::warning(&format!("Port {} in use, using {}", start_port, preview.port()));
    }
    Output::success(&format!("Serving {}", preview.directory().display()));
    Output::kv("Base URL", &base);
    Output::kv("Homepage", &format!("{}/index.html", base));
    println!();
    Output::info("Press Ctrl+C to stop.");

    preview.run().await?;
    Ok(())
}
