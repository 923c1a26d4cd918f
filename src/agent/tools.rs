//! Tool definitions and implementations for the agent system.

use crate::backend::{ContentBackend, MediaUpload, PageDraft};
use crate::error::{AgentError, Result};
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Every tool the local agent can execute.
pub const KNOWN_TOOLS: [&str; 4] = ["create_page", "update_page", "upload_media", "get_pages"];

/// Available tools for the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    /// Create a new page.
    CreatePage {
        title: String,
        content: String,
        #[serde(default)]
        status: Option<String>,
    },

    /// Update an existing page.
    UpdatePage {
        page_id: u64,
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        title: Option<String>,
    },

    /// Upload a local file to the media library.
    UploadMedia { path: PathBuf },

    /// List pages on the site.
    GetPages,
}

impl ToolCall {
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::CreatePage { .. } => "create_page",
            ToolCall::UpdatePage { .. } => "update_page",
            ToolCall::UploadMedia { .. } => "upload_media",
            ToolCall::GetPages => "get_pages",
        }
    }
}

/// Tool execution context with access to the backend gateway.
pub struct ToolContext {
    pub backend: Arc<dyn ContentBackend>,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(backend: Arc<dyn ContentBackend>) -> Self {
        Self { backend }
    }

    /// Execute a tool call and return the result as a string.
    pub async fn execute(&self, tool: &ToolCall) -> Result<String> {
        match tool {
            ToolCall::CreatePage {
                title,
                content,
                status,
            } => self.execute_create_page(title, content, status.as_deref()).await,
            ToolCall::UpdatePage {
                page_id,
                content,
                title,
            } => {
                self.execute_update_page(*page_id, content.clone(), title.clone())
                    .await
            }
            ToolCall::UploadMedia { path } => self.execute_upload_media(path).await,
            ToolCall::GetPages => self.execute_get_pages().await,
        }
    }

    async fn execute_create_page(
        &self,
        title: &str,
        content: &str,
        status: Option<&str>,
    ) -> Result<String> {
        let mut draft = PageDraft::publish(title, content);
        if let Some(status) = status {
            draft.status = Some(status.to_string());
        }

        let created = self.backend.create_page(&draft).await?;
        Ok(format!(
            "Created page '{}' (ID: {}, link: {})",
            title,
            created.get("id").unwrap_or(&Value::Null),
            created.get("link").and_then(Value::as_str).unwrap_or("n/a")
        ))
    }

    async fn execute_update_page(
        &self,
        page_id: u64,
        content: Option<String>,
        title: Option<String>,
    ) -> Result<String> {
        if content.is_none() && title.is_none() {
            return Err(
                AgentError::ToolFailed("update_page needs 'content' or 'title'".to_string()).into(),
            );
        }

        let draft = PageDraft {
            title,
            content,
            ..Default::default()
        };
        self.backend.update_page(page_id, &draft).await?;
        Ok(format!("Updated page {}", page_id))
    }

    async fn execute_upload_media(&self, path: &PathBuf) -> Result<String> {
        let media = MediaUpload::from_path(path).await?;
        let filename = media.filename.clone();
        let uploaded = self.backend.upload_media(media).await?;

        Ok(format!(
            "Uploaded {} (media ID: {}, url: {})",
            filename,
            uploaded.get("id").unwrap_or(&Value::Null),
            uploaded
                .get("source_url")
                .and_then(Value::as_str)
                .unwrap_or("n/a")
        ))
    }

    async fn execute_get_pages(&self) -> Result<String> {
        let pages = self.backend.list_pages().await?;
        let pages = pages.as_array().cloned().unwrap_or_default();

        if pages.is_empty() {
            return Ok("No pages found.".to_string());
        }

        let formatted = pages
            .iter()
            .map(|p| {
                format!(
                    "- {} (ID: {}, {})",
                    page_title(p),
                    p.get("id").unwrap_or(&Value::Null),
                    p.get("link").and_then(Value::as_str).unwrap_or("no link")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(format!("Found {} pages:\n\n{}", pages.len(), formatted))
    }
}

/// Page title from a REST listing entry, which may be plain or `{rendered}`.
fn page_title(page: &Value) -> &str {
    match page.get("title") {
        Some(Value::String(s)) => s,
        Some(t) => t.get("rendered").and_then(Value::as_str).unwrap_or("(untitled)"),
        None => "(untitled)",
    }
}

fn definition(name: &str, description: &str, parameters: Value) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: name.to_string(),
            description: Some(description.to_string()),
            parameters: Some(parameters),
            strict: None,
        },
    }
}

/// Get OpenAI function/tool definitions for the allowed tools, in `allowed` order.
pub fn tool_definitions(allowed: &[String]) -> Vec<ChatCompletionTool> {
    allowed
        .iter()
        .filter_map(|name| match name.as_str() {
            "create_page" => Some(definition(
                "create_page",
                "Create and publish a new page on the website.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "title": {
                            "type": "string",
                            "description": "Page title"
                        },
                        "content": {
                            "type": "string",
                            "description": "Page body as HTML"
                        },
                        "status": {
                            "type": "string",
                            "description": "Publication status (default: publish)",
                            "enum": ["publish", "draft", "private"]
                        }
                    },
                    "required": ["title", "content"]
                }),
            )),
            "update_page" => Some(definition(
                "update_page",
                "Update the content and/or title of an existing page by its numeric ID.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "page_id": {
                            "type": "integer",
                            "description": "The page ID"
                        },
                        "content": {
                            "type": "string",
                            "description": "New page body as HTML"
                        },
                        "title": {
                            "type": "string",
                            "description": "New page title"
                        }
                    },
                    "required": ["page_id"]
                }),
            )),
            "upload_media" => Some(definition(
                "upload_media",
                "Upload a local file (image, PDF, ...) to the media library.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "Path to the file on disk"
                        }
                    },
                    "required": ["path"]
                }),
            )),
            "get_pages" => Some(definition(
                "get_pages",
                "List the pages on the website with their IDs, titles and links.",
                serde_json::json!({
                    "type": "object",
                    "properties": {}
                }),
            )),
            _ => None,
        })
        .collect()
}

fn missing(arg: &str) -> AgentError {
    AgentError::ToolFailed(format!("Missing '{}' argument", arg))
}

/// Parse a tool call from the OpenAI response format.
pub fn parse_tool_call(name: &str, arguments: &str) -> std::result::Result<ToolCall, AgentError> {
    let args: Value = if arguments.trim().is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_str(arguments)
            .map_err(|e| AgentError::ToolFailed(format!("Invalid tool arguments: {}", e)))?
    };
    let optional = |key: &str| args[key].as_str().map(str::to_string);

    match name {
        "create_page" => Ok(ToolCall::CreatePage {
            title: optional("title").ok_or_else(|| missing("title"))?,
            content: optional("content").ok_or_else(|| missing("content"))?,
            status: optional("status"),
        }),
        "update_page" => {
            // Models sometimes send numeric IDs as strings.
            let page_id = args["page_id"]
                .as_u64()
                .or_else(|| args["page_id"].as_str().and_then(|s| s.parse().ok()))
                .ok_or_else(|| missing("page_id"))?;
            Ok(ToolCall::UpdatePage {
                page_id,
                content: optional("content"),
                title: optional("title"),
            })
        }
        "upload_media" => Ok(ToolCall::UploadMedia {
            path: optional("path").ok_or_else(|| missing("path"))?.into(),
        }),
        "get_pages" => Ok(ToolCall::GetPages),
        _ => Err(AgentError::ToolFailed(format!("Unknown tool: {}", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingBackend;

    fn allowed(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_create_page_tool() {
        let tool = parse_tool_call(
            "create_page",
            r#"{"title": "Q4 Guide", "content": "<p>x</p>"}"#,
        )
        .unwrap();
        assert_eq!(
            tool,
            ToolCall::CreatePage {
                title: "Q4 Guide".to_string(),
                content: "<p>x</p>".to_string(),
                status: None,
            }
        );
    }

    #[test]
    fn test_parse_update_page_accepts_string_id() {
        let tool = parse_tool_call("update_page", r#"{"page_id": "1272", "content": "c"}"#).unwrap();
        match tool {
            ToolCall::UpdatePage { page_id, .. } => assert_eq!(page_id, 1272),
            _ => panic!("Expected UpdatePage tool"),
        }
    }

    #[test]
    fn test_parse_get_pages_with_empty_arguments() {
        assert_eq!(parse_tool_call("get_pages", "").unwrap(), ToolCall::GetPages);
    }

    #[test]
    fn test_parse_rejects_missing_arguments() {
        let err = parse_tool_call("create_page", r#"{"title": "only"}"#).unwrap_err();
        assert_eq!(err, AgentError::ToolFailed("Missing 'content' argument".to_string()));
        assert!(parse_tool_call("delete_site", "{}").is_err());
    }

    #[test]
    fn test_tool_definitions_follow_allowed_order() {
        let defs = tool_definitions(&allowed(&["get_pages", "create_page", "bogus"]));
        let names: Vec<_> = defs.iter().map(|d| d.function.name.as_str()).collect();
        assert_eq!(names, vec!["get_pages", "create_page"]);
    }

    #[tokio::test]
    async fn test_execute_create_page_hits_backend() {
        let backend = Arc::new(RecordingBackend::default());
        let context = ToolContext::new(backend.clone());

        let output = context
            .execute(&ToolCall::CreatePage {
                title: "About".to_string(),
                content: "<p>hi</p>".to_string(),
                status: Some("draft".to_string()),
            })
            .await
            .unwrap();

        assert!(output.contains("Created page 'About'"));
        let created = backend.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].status.as_deref(), Some("draft"));
    }

    #[tokio::test]
    async fn test_execute_update_page_requires_a_field() {
        let backend = Arc::new(RecordingBackend::default());
        let context = ToolContext::new(backend.clone());

        let result = context
            .execute(&ToolCall::UpdatePage {
                page_id: 5,
                content: None,
                title: None,
            })
            .await;
        assert!(result.is_err());
        assert!(backend.updated().is_empty());
    }

    #[tokio::test]
    async fn test_execute_get_pages_formats_rendered_titles() {
        let backend = Arc::new(RecordingBackend::with_pages(serde_json::json!([
            {"id": 1272, "title": {"rendered": "Home"}, "link": "https://example.com/"}
        ])));
        let output = ToolContext::new(backend)
            .execute(&ToolCall::GetPages)
            .await
            .unwrap();

        assert!(output.starts_with("Found 1 pages"));
        assert!(output.contains("Home (ID: 1272, https://example.com/)"));
    }
}
