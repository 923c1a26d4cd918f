//! MCP (Model Context Protocol) server for Quill.
//!
//! Exposes the backend page/media tools and page generation to MCP clients.
//! Implements JSON-RPC 2.0 over stdio; all logging goes to stderr.

mod protocol;
mod server;
mod tools;

pub use server::McpServer;
