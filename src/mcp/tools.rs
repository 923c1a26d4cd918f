//! MCP tool definitions for Quill.

use super::protocol::Tool;
use crate::agent::{tool_definitions, KNOWN_TOOLS};
use serde_json::json;

/// Get all available tools: the backend tools shared with the local agent,
/// plus `generate_page`.
pub fn get_tools() -> Vec<Tool> {
    let backend_tools: Vec<String> = KNOWN_TOOLS.iter().map(|s| s.to_string()).collect();

    let mut tools: Vec<Tool> = tool_definitions(&backend_tools)
        .into_iter()
        .map(|t| Tool {
            name: t.function.name,
            description: t.function.description.unwrap_or_default(),
            input_schema: t
                .function
                .parameters
                .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
        })
        .collect();

    tools.push(Tool {
        name: "generate_page".to_string(),
        description: "Generate SEO-friendly page content about a topic with the LLM \
            and publish it as a new page through the content agent."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "Title of the new page"
                },
                "topic": {
                    "type": "string",
                    "description": "What the page should be about"
                },
                "optimize": {
                    "type": "boolean",
                    "description": "Run an SEO optimization pass before publishing",
                    "default": false
                }
            },
            "required": ["title", "topic"]
        }),
    });

    tools
}
