//! In-memory doubles shared by unit tests.

use crate::agent::{AgentResult, BridgeConfig, ToolAgent};
use crate::backend::{ContentBackend, MediaUpload, PageDraft, SiteStatus};
use crate::error::{AgentError, QuillError, Result};
use crate::llm::{CompletionRequest, LanguageModel};
use crate::metrics::{MetricsProvider, MetricsSnapshot, TaskId};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Language model that always answers with the same text.
pub struct StubModel {
    response: String,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl StubModel {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request);
        Ok(self.response.clone())
    }
}

/// Language model whose every call fails.
pub struct FailingModel {
    message: String,
}

impl FailingModel {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl LanguageModel for FailingModel {
    async fn complete(&self, _request: CompletionRequest) -> Result<String> {
        Err(QuillError::OpenAI(self.message.clone()))
    }
}

/// Agent that records instructions and replays queued results.
///
/// Once the queue is empty every call succeeds with the instruction echoed.
pub struct ScriptedAgent {
    config: BridgeConfig,
    script: Mutex<VecDeque<std::result::Result<AgentResult, AgentError>>>,
    instructions: Mutex<Vec<String>>,
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self {
            config: BridgeConfig::new("scripted", crate::agent::KNOWN_TOOLS, 10),
            script: Mutex::new(VecDeque::new()),
            instructions: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, result: std::result::Result<AgentResult, AgentError>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn then_output(self, output: &str) -> Self {
        self.then(Ok(AgentResult {
            output: output.to_string(),
            tool_calls: Vec::new(),
            steps: 1,
        }))
    }

    pub fn then_fail(self, error: AgentError) -> Self {
        self.then(Err(error))
    }

    pub fn instructions(&self) -> Vec<String> {
        self.instructions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolAgent for ScriptedAgent {
    async fn execute(&self, instruction: &str) -> std::result::Result<AgentResult, AgentError> {
        self.instructions
            .lock()
            .unwrap()
            .push(instruction.to_string());
        match self.script.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(AgentResult {
                output: instruction.to_string(),
                tool_calls: Vec::new(),
                steps: 1,
            }),
        }
    }

    fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

/// Backend that records writes and serves a fixed page listing.
#[derive(Default)]
pub struct RecordingBackend {
    pages: Value,
    created: Mutex<Vec<PageDraft>>,
    updated: Mutex<Vec<(u64, PageDraft)>>,
    uploads: Mutex<Vec<String>>,
    list_calls: AtomicUsize,
    fail_with: Option<(u16, String)>,
}

impl RecordingBackend {
    pub fn with_pages(pages: Value) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    /// A backend whose every call returns the given HTTP error.
    pub fn failing(status: u16, message: &str) -> Self {
        Self {
            fail_with: Some((status, message.to_string())),
            ..Default::default()
        }
    }

    pub fn created(&self) -> Vec<PageDraft> {
        self.created.lock().unwrap().clone()
    }

    pub fn updated(&self) -> Vec<(u64, PageDraft)> {
        self.updated.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        match &self.fail_with {
            Some((status, message)) => Err(QuillError::Backend {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContentBackend for RecordingBackend {
    async fn create_page(&self, page: &PageDraft) -> Result<Value> {
        self.check()?;
        let mut created = self.created.lock().unwrap();
        created.push(page.clone());
        Ok(serde_json::json!({
            "id": 100 + created.len(),
            "title": {"rendered": page.title.clone().unwrap_or_default()},
            "link": "https://example.com/new-page/"
        }))
    }

    async fn update_page(&self, page_id: u64, page: &PageDraft) -> Result<Value> {
        self.check()?;
        self.updated.lock().unwrap().push((page_id, page.clone()));
        Ok(serde_json::json!({"id": page_id}))
    }

    async fn upload_media(&self, media: MediaUpload) -> Result<Value> {
        self.check()?;
        self.uploads.lock().unwrap().push(media.filename.clone());
        Ok(serde_json::json!({
            "id": 7,
            "source_url": format!("https://example.com/uploads/{}", media.filename)
        }))
    }

    async fn list_pages(&self) -> Result<Value> {
        self.check()?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.pages.is_null() {
            Ok(Value::Array(Vec::new()))
        } else {
            Ok(self.pages.clone())
        }
    }

    async fn site_status(&self) -> Result<SiteStatus> {
        self.check()?;
        Ok(SiteStatus {
            api_version: "6.6".to_string(),
        })
    }
}

/// Metrics provider whose every call fails.
pub struct BrokenMetrics;

#[async_trait]
impl MetricsProvider for BrokenMetrics {
    async fn task_started(&self, _label: &str) -> Result<TaskId> {
        Err(QuillError::Metrics("store offline".to_string()))
    }

    async fn task_finished(&self, _id: TaskId, _success: bool) -> Result<()> {
        Err(QuillError::Metrics("store offline".to_string()))
    }

    async fn snapshot(&self) -> Result<MetricsSnapshot> {
        Err(QuillError::Metrics("store offline".to_string()))
    }
}

/// Agent that never answers within a test's lifetime.
pub struct StallingAgent {
    config: BridgeConfig,
}

impl StallingAgent {
    pub fn new() -> Self {
        Self {
            config: BridgeConfig::new("stalling", crate::agent::KNOWN_TOOLS, 10),
        }
    }
}

#[async_trait]
impl ToolAgent for StallingAgent {
    async fn execute(&self, _instruction: &str) -> std::result::Result<AgentResult, AgentError> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Err(AgentError::Reported("stalled".to_string()))
    }

    fn config(&self) -> &BridgeConfig {
        &self.config
    }
}
