//! Quill - AI content orchestration for a WordPress site
//!
//! Quill generates page content with an LLM, optionally runs a second SEO pass
//! over it, and delegates publishing to a tool-calling agent that works against
//! the site's REST API with a bounded step budget.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `llm` - Language model abstraction (OpenAI-backed)
//! - `content` - Content generation and SEO optimization
//! - `backend` - Content backend gateway (WordPress REST API)
//! - `agent` - Tool agent bridge (local loop, remote process, echo)
//! - `metrics` - Task metrics providers (SQLite, in-memory)
//! - `orchestrator` - Composes the above into page operations
//! - `server` - HTTP API and authenticated backend passthrough
//! - `mcp` - MCP server exposing the backend tools
//! - `preview` - Local static preview server
//!
//! # Example
//!
//! ```rust,no_run
//! use quill::config::Settings;
//! use quill::orchestrator::ContentOrchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = ContentOrchestrator::new(&settings)?;
//!
//!     let outcome = orchestrator.create_page("Q4 Guide", "Q4 Tax Planning").await;
//!     println!("{}", serde_json::to_string_pretty(&outcome)?);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod backend;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod llm;
pub mod mcp;
pub mod metrics;
pub mod openai;
pub mod orchestrator;
pub mod preview;
pub mod server;

#[cfg(test)]
mod testing;

pub use error::{AgentError, QuillError, Result};
