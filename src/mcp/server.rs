//! MCP server implementation.

use super::protocol::*;
use super::tools::get_tools;
use crate::agent::{parse_tool_call, ToolContext};
use crate::backend::{ContentBackend, WordPressBackend};
use crate::config::Settings;
use crate::content::ContentRequest;
use crate::orchestrator::ContentOrchestrator;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "quill";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Components built on `initialize`.
struct Services {
    tools: ToolContext,
    orchestrator: ContentOrchestrator,
}

/// MCP Server for Quill.
pub struct McpServer {
    settings: Settings,
    services: Option<Services>,
}

impl McpServer {
    /// Create a new MCP server. Components are built lazily on `initialize`.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            services: None,
        }
    }

    /// Create a server with pre-built components.
    pub fn with_components(
        backend: Arc<dyn ContentBackend>,
        orchestrator: ContentOrchestrator,
    ) -> Self {
        Self {
            settings: Settings::default(),
            services: Some(Services {
                tools: ToolContext::new(backend),
                orchestrator,
            }),
        }
    }

    /// Run the MCP server (reads from stdin, writes to stdout).
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        info!("Quill MCP server starting");

        while let Some(line) = lines.next_line().await? {
            if let Some(response) = self.handle_line(&line).await {
                let mut payload = serde_json::to_string(&response)?;
                payload.push('\n');
                stdout.write_all(payload.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        info!("Stdin closed, MCP server exiting");
        Ok(())
    }

    /// Handle one line of input. Returns `None` when no reply is due.
    pub async fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                warn!("Failed to parse request: {}", e);
                return Some(JsonRpcResponse::error(None, PARSE_ERROR, "Parse error"));
            }
        };

        if request.is_notification() {
            debug!("Notification: {}", request.method);
            return None;
        }

        if !request.has_supported_version() {
            warn!("Unsupported JSON-RPC version: {}", request.jsonrpc);
            return Some(JsonRpcResponse::error(
                request.id,
                INVALID_REQUEST,
                &format!("Unsupported jsonrpc version: {}", request.jsonrpc),
            ));
        }

        Some(self.handle_request(request).await)
    }

    /// Handle a single JSON-RPC request.
    async fn handle_request(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => {
                JsonRpcResponse::from_serializable(request.id, &ToolsListResult { tools: get_tools() })
            }
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            _ => JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {}", request.method),
            ),
        }
    }

    /// Handle initialize request.
    fn handle_initialize(&mut self, id: Option<Value>) -> JsonRpcResponse {
        if self.services.is_none() {
            match self.build_services() {
                Ok(services) => {
                    self.services = Some(services);
                    info!("MCP services initialized");
                }
                Err(e) => {
                    warn!("Failed to initialize MCP services: {}", e);
                    return JsonRpcResponse::error(id, SERVER_ERROR, &format!("Init failed: {}", e));
                }
            }
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability { list_changed: false },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        };

        JsonRpcResponse::from_serializable(id, &result)
    }

    fn build_services(&self) -> crate::Result<Services> {
        let backend: Arc<dyn ContentBackend> =
            Arc::new(WordPressBackend::from_settings(&self.settings.backend)?);
        let orchestrator = ContentOrchestrator::new(&self.settings)?;
        Ok(Services {
            tools: ToolContext::new(backend),
            orchestrator,
        })
    }

    /// Handle tools/call request.
    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(id, INVALID_PARAMS, &format!("Invalid params: {}", e))
                }
            },
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        let Some(services) = &self.services else {
            return JsonRpcResponse::from_serializable(
                id,
                &ToolCallResult::error("Server not initialized".to_string()),
            );
        };

        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        let result = match params.name.as_str() {
            "generate_page" => Self::tool_generate_page(services, &arguments).await,
            name => Self::tool_backend(services, name, &arguments).await,
        };

        JsonRpcResponse::from_serializable(id, &result)
    }

    /// Backend tools, executed directly without the agent.
    async fn tool_backend(services: &Services, name: &str, arguments: &Value) -> ToolCallResult {
        let tool = match parse_tool_call(name, &arguments.to_string()) {
            Ok(tool) => tool,
            Err(e) => return ToolCallResult::error(e.to_string()),
        };

        match services.tools.execute(&tool).await {
            Ok(output) => ToolCallResult::text(output),
            Err(e) => ToolCallResult::error(format!("{} failed: {}", name, e)),
        }
    }

    /// Generate-and-publish tool.
    async fn tool_generate_page(services: &Services, arguments: &Value) -> ToolCallResult {
        let (Some(title), Some(topic)) = (
            arguments.get("title").and_then(Value::as_str),
            arguments.get("topic").and_then(Value::as_str),
        ) else {
            return ToolCallResult::error("Missing 'title' or 'topic' argument".to_string());
        };
        let optimize = arguments
            .get("optimize")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let outcome = services
            .orchestrator
            .create_page_with(ContentRequest::new(title, topic), optimize)
            .await;

        match (outcome.payload(), outcome.error()) {
            (Some(payload), _) => ToolCallResult::text(format!(
                "Published '{}' ({} characters).\n\n{}",
                title,
                payload["content_length"],
                payload["result"]["output"].as_str().unwrap_or_default()
            )),
            (None, error) => ToolCallResult::error(format!(
                "Page generation failed: {}",
                error.unwrap_or("unknown error")
            )),
        }
    }
}
