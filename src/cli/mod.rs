//! CLI module for Quill.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quill - AI content orchestration for a WordPress site
///
/// Generates page content with an LLM, optionally optimizes it for search, and
/// hands publishing to a tool-calling agent working against the site's REST API.
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Quill and write a default configuration
    Init,

    /// Check API keys, backend credentials and configuration
    Doctor,

    /// Generate page content without publishing it
    Generate {
        /// What the page should be about
        topic: String,

        /// Run the SEO optimization pass on the generated content
        #[arg(long)]
        seo: bool,

        /// Write the HTML to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate content and publish it as a new page through the agent
    CreatePage {
        /// Title of the new page
        title: String,

        /// What the page should be about
        topic: String,

        /// Optimize the content for SEO before publishing
        #[arg(long)]
        seo: bool,
    },

    /// Replace the homepage content through the agent
    UpdateHomepage {
        /// New homepage HTML
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        content: Option<String>,

        /// Read the new homepage HTML from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Optimize existing content for SEO
    Optimize {
        /// Content to optimize
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        content: Option<String>,

        /// Read the content from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show agent status and task metrics
    Status,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to [server] host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to [server] port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Start MCP server for AI assistant integration (Claude, etc.)
    Mcp,

    /// Serve a directory of static pages on the first free port
    Preview {
        /// Directory to serve (defaults to [preview] directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// First port to try (defaults to [preview] start_port)
        #[arg(long)]
        start_port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "llm.model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

/// Content given inline or through `--file`.
pub fn read_content(inline: Option<&str>, file: Option<&PathBuf>) -> anyhow::Result<String> {
    match (inline, file) {
        (_, Some(path)) => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e)),
        (Some(content), None) => Ok(content.to_string()),
        (None, None) => anyhow::bail!("Provide content inline or with --file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create_page() {
        let cli = Cli::parse_from(["quill", "-v", "create-page", "Q4 Guide", "Q4 Tax Planning", "--seo"]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::CreatePage { title, topic, seo } => {
                assert_eq!(title, "Q4 Guide");
                assert_eq!(topic, "Q4 Tax Planning");
                assert!(seo);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_update_homepage_needs_content() {
        assert!(Cli::try_parse_from(["quill", "update-homepage"]).is_err());
        assert!(Cli::try_parse_from(["quill", "update-homepage", "<p>x</p>", "--file", "a.html"]).is_err());
    }

    #[test]
    fn test_read_content_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("home.html");
        std::fs::write(&path, "<p>home</p>").unwrap();

        assert_eq!(read_content(None, Some(&path)).unwrap(), "<p>home</p>");
        assert_eq!(read_content(Some("inline"), None).unwrap(), "inline");
        assert!(read_content(None, None).is_err());
    }
}
