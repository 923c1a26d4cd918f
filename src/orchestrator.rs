//! Content orchestrator for Quill.
//!
//! Sequences content generation, optional SEO optimization and delegation to
//! the tool agent. Every public operation returns a well-formed outcome; no
//! error crosses this boundary. Steps run strictly in order, a failing step
//! aborts the operation, and nothing is retried or compensated.

use crate::agent::{self, AgentResult, ToolAgent};
use crate::config::{LlmSettings, Prompts, Settings};
use crate::content::{ContentGenerator, ContentRequest, SeoOptimizer};
use crate::error::{QuillError, Result};
use crate::llm::{LanguageModel, OpenAIModel};
use crate::metrics::{self, MetricsProvider, MetricsSnapshot, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Uniform result envelope of an orchestrator operation.
///
/// Exactly one of `payload` and `error` is set, matching `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OutcomeFields")]
pub struct OperationOutcome {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Wire form of an outcome, checked before it becomes an `OperationOutcome`.
#[derive(Deserialize)]
struct OutcomeFields {
    success: bool,
    #[serde(default)]
    payload: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl TryFrom<OutcomeFields> for OperationOutcome {
    type Error = String;

    fn try_from(fields: OutcomeFields) -> std::result::Result<Self, Self::Error> {
        match (fields.success, fields.payload, fields.error) {
            (true, Some(payload), None) => Ok(Self::succeeded(payload)),
            (false, None, Some(error)) => Ok(Self::failed(error)),
            (true, _, _) => Err("successful outcome needs a payload and no error".to_string()),
            (false, _, _) => Err("failed outcome needs an error and no payload".to_string()),
        }
    }
}

impl OperationOutcome {
    pub fn succeeded(payload: Value) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(error.into()),
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Overall agent health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    Active,
    Error,
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentState::Active => write!(f, "active"),
            AgentState::Error => write!(f, "error"),
        }
    }
}

/// Status report recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatusSnapshot {
    pub status: AgentState,
    pub tasks_completed: u64,
    /// Percentage 0-100.
    pub success_rate: f64,
    pub queue_length: u64,
    pub current_task: Option<String>,
    pub last_activity: Option<DateTime<Utc>>,
    /// The agent's answer to the page-count instruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentStatusSnapshot {
    fn new(status: AgentState, metrics: MetricsSnapshot) -> Self {
        Self {
            status,
            tasks_completed: metrics.tasks_completed,
            success_rate: metrics.success_rate,
            queue_length: metrics.queue_length,
            current_task: metrics.current_task,
            last_activity: metrics.last_activity,
            pages_count: None,
            error: None,
        }
    }
}

/// The main orchestrator for content operations.
pub struct ContentOrchestrator {
    generator: ContentGenerator,
    optimizer: SeoOptimizer,
    agent: Arc<dyn ToolAgent>,
    metrics: Arc<dyn MetricsProvider>,
    prompts: Prompts,
    homepage_id: Option<u64>,
}

impl ContentOrchestrator {
    /// Create an orchestrator wired from settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let model: Arc<dyn LanguageModel> = Arc::new(OpenAIModel::new()?);
        let agent = agent::from_settings(settings, &prompts)?;
        let metrics = metrics::from_settings(settings)?;

        if settings.site.homepage_id.is_none() {
            info!("No [site] homepage_id configured; update_homepage is disabled");
        }

        Ok(Self::with_components(
            model,
            agent,
            metrics,
            prompts,
            settings.llm.clone(),
            settings.site.homepage_id,
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        model: Arc<dyn LanguageModel>,
        agent: Arc<dyn ToolAgent>,
        metrics: Arc<dyn MetricsProvider>,
        prompts: Prompts,
        llm: LlmSettings,
        homepage_id: Option<u64>,
    ) -> Self {
        Self {
            generator: ContentGenerator::new(model.clone(), prompts.clone(), llm.clone()),
            optimizer: SeoOptimizer::new(model, prompts.clone(), llm),
            agent,
            metrics,
            prompts,
            homepage_id,
        }
    }

    /// The configured homepage ID, if any.
    pub fn homepage_id(&self) -> Option<u64> {
        self.homepage_id
    }

    /// Generate content for `topic` and have the agent publish it as `title`.
    pub async fn create_page(&self, title: &str, topic: &str) -> OperationOutcome {
        self.create_page_with(ContentRequest::new(title, topic), false)
            .await
    }

    /// Generate, optionally SEO-optimize, and publish a page.
    #[instrument(skip(self, request), fields(title = %request.target_title))]
    pub async fn create_page_with(&self, request: ContentRequest, optimize: bool) -> OperationOutcome {
        self.tracked("create_page", self.publish_page(&request, optimize))
            .await
    }

    /// Replace the homepage content.
    ///
    /// Issues a lookup instruction before the update. The lookup's answer is
    /// not used; the update always targets the configured homepage ID.
    #[instrument(skip(self, new_content), fields(content_len = new_content.len()))]
    pub async fn update_homepage(&self, new_content: &str) -> OperationOutcome {
        self.tracked("update_homepage", self.replace_homepage(new_content))
            .await
    }

    /// Rewrite `content` for search engines.
    #[instrument(skip(self, content), fields(content_len = content.len()))]
    pub async fn optimize_seo_content(&self, content: &str) -> OperationOutcome {
        self.tracked("optimize_seo_content", self.optimize(content))
            .await
    }

    /// Report agent health merged with recorded task metrics.
    ///
    /// Never fails: a bridge failure is reported as `status: error`.
    #[instrument(skip(self))]
    pub async fn get_agent_status(&self) -> AgentStatusSnapshot {
        let instruction = self.instruction(&self.prompts.agent.page_count, &[]);
        let probe = self.agent.execute(&instruction).await;

        let metrics = match self.metrics.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Metrics unavailable, reporting zeroes: {}", e);
                MetricsSnapshot::default()
            }
        };

        match probe {
            Ok(result) => {
                let mut snapshot = AgentStatusSnapshot::new(AgentState::Active, metrics);
                snapshot.pages_count = Some(result.output);
                snapshot
            }
            Err(e) => {
                warn!("Agent status probe failed: {}", e);
                let mut snapshot = AgentStatusSnapshot::new(AgentState::Error, metrics);
                snapshot.error = Some(e.to_string());
                snapshot
            }
        }
    }

    async fn publish_page(&self, request: &ContentRequest, optimize: bool) -> Result<Value> {
        let mut content = self.generator.generate(&request.topic).await?;
        if optimize {
            content = self.optimizer.optimize(&content.html).await?;
        }

        let instruction = self.instruction(
            &self.prompts.agent.create_page,
            &[
                ("title", request.target_title.as_str()),
                ("content", content.html.as_str()),
            ],
        );
        let result = self.delegate(&instruction).await?;

        Ok(json!({
            "page_title": request.target_title,
            "content_length": content.length,
            "optimized": optimize,
            "result": result,
        }))
    }

    async fn replace_homepage(&self, new_content: &str) -> Result<Value> {
        let page_id = self.homepage_id.ok_or_else(|| {
            QuillError::Config(
                "No homepage configured. Set site.homepage_id in the config file.".to_string(),
            )
        })?;
        let id = page_id.to_string();

        let lookup = self.instruction(&self.prompts.agent.find_homepage, &[("page_id", id.as_str())]);
        let found = self.delegate(&lookup).await?;
        debug!("Homepage lookup answered (discarded): {}", found.output);

        let update = self.instruction(
            &self.prompts.agent.update_homepage,
            &[("page_id", id.as_str()), ("content", new_content)],
        );
        let result = self.delegate(&update).await?;

        Ok(json!({
            "message": "Homepage updated successfully",
            "page_id": page_id,
            "result": result,
        }))
    }

    async fn optimize(&self, content: &str) -> Result<Value> {
        let optimized = self.optimizer.optimize(content).await?;
        Ok(json!({
            "html": optimized.html,
            "content_length": optimized.length,
        }))
    }

    fn instruction(&self, template: &str, vars: &[(&str, &str)]) -> String {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.prompts.render_with_custom(template, &vars)
    }

    async fn delegate(&self, instruction: &str) -> Result<AgentResult> {
        let result = self.agent.execute(instruction).await?;
        info!(
            "Agent finished in {} step(s) with {} tool call(s)",
            result.steps,
            result.tool_calls.len()
        );
        Ok(result)
    }

    /// Run `operation` as a recorded task and fold its result into an outcome.
    ///
    /// Metrics failures are logged and never change the outcome. If the
    /// operation is dropped before it completes, the task is recorded as failed.
    async fn tracked<F>(&self, label: &str, operation: F) -> OperationOutcome
    where
        F: Future<Output = Result<Value>>,
    {
        let mut task = match self.metrics.task_started(label).await {
            Ok(id) => Some(TaskGuard::new(self.metrics.clone(), id, label)),
            Err(e) => {
                warn!("Failed to record start of {}: {}", label, e);
                None
            }
        };

        let outcome = match operation.await {
            Ok(payload) => OperationOutcome::succeeded(payload),
            Err(e) => {
                warn!("{} failed: {}", label, e);
                OperationOutcome::failed(e.to_string())
            }
        };

        if let Some(guard) = task.as_mut() {
            guard.finish(outcome.success()).await;
        }

        outcome
    }
}

/// An in-flight task record. Dropping it unfinished records a failure.
struct TaskGuard {
    metrics: Arc<dyn MetricsProvider>,
    id: Option<TaskId>,
    label: String,
}

impl TaskGuard {
    fn new(metrics: Arc<dyn MetricsProvider>, id: TaskId, label: &str) -> Self {
        Self {
            metrics,
            id: Some(id),
            label: label.to_string(),
        }
    }

    async fn finish(&mut self, success: bool) {
        if let Some(id) = self.id.take() {
            if let Err(e) = self.metrics.task_finished(id, success).await {
                warn!("Failed to record end of {}: {}", self.label, e);
            }
        }
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        warn!("{} was cancelled before it finished", self.label);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime to record cancellation of {}", self.label);
            return;
        };
        let metrics = self.metrics.clone();
        let label = std::mem::take(&mut self.label);
        runtime.spawn(async move {
            if let Err(e) = metrics.task_finished(id, false).await {
                warn!("Failed to record end of {}: {}", label, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::metrics::MemoryMetrics;
    use crate::testing::{BrokenMetrics, FailingModel, ScriptedAgent, StallingAgent, StubModel};
    use std::time::Duration;

    fn orchestrator(
        model: Arc<dyn LanguageModel>,
        agent: Arc<dyn ToolAgent>,
        metrics: Arc<dyn MetricsProvider>,
        homepage_id: Option<u64>,
    ) -> ContentOrchestrator {
        ContentOrchestrator::with_components(
            model,
            agent,
            metrics,
            Prompts::default(),
            LlmSettings::default(),
            homepage_id,
        )
    }

    #[tokio::test]
    async fn test_create_page_scenario() {
        let agent = Arc::new(ScriptedAgent::new());
        let orch = orchestrator(
            Arc::new(StubModel::new("<p>stub</p>")),
            agent.clone(),
            Arc::new(MemoryMetrics::new()),
            None,
        );

        let outcome = orch.create_page("Q4 Guide", "Q4 Tax Planning").await;

        assert!(outcome.success());
        assert!(outcome.error().is_none());
        let payload = outcome.payload().unwrap();
        assert_eq!(payload["page_title"], "Q4 Guide");
        assert_eq!(payload["content_length"], 11);
        assert_eq!(payload["optimized"], false);

        let instructions = agent.instructions();
        assert_eq!(instructions.len(), 1);
        assert_eq!(
            instructions[0],
            "Create a new page titled 'Q4 Guide' with the following content: <p>stub</p>"
        );
    }

    #[tokio::test]
    async fn test_create_page_generation_failure_short_circuits() {
        let agent = Arc::new(ScriptedAgent::new());
        let orch = orchestrator(
            Arc::new(FailingModel::new("model down")),
            agent.clone(),
            Arc::new(MemoryMetrics::new()),
            None,
        );

        let outcome = orch.create_page("Q4 Guide", "Q4 Tax Planning").await;

        assert!(!outcome.success());
        assert!(outcome.payload().is_none());
        assert!(outcome.error().unwrap().contains("model down"));
        assert!(agent.instructions().is_empty());
    }

    #[tokio::test]
    async fn test_create_page_agent_error_is_verbatim() {
        let agent = Arc::new(
            ScriptedAgent::new()
                .then_fail(AgentError::Reported("step budget exceeded".to_string())),
        );
        let orch = orchestrator(
            Arc::new(StubModel::new("<p>stub</p>")),
            agent,
            Arc::new(MemoryMetrics::new()),
            None,
        );

        let outcome = orch.create_page("Q4 Guide", "Q4 Tax Planning").await;

        assert!(!outcome.success());
        assert_eq!(outcome.error(), Some("step budget exceeded"));
    }

    #[tokio::test]
    async fn test_create_page_step_budget_exhausted() {
        let agent = Arc::new(ScriptedAgent::new().then_fail(AgentError::StepBudgetExceeded(10)));
        let metrics = Arc::new(MemoryMetrics::new());
        let orch = orchestrator(
            Arc::new(StubModel::new("<p>stub</p>")),
            agent,
            metrics.clone(),
            None,
        );

        let outcome = orch.create_page("Q4 Guide", "Q4 Tax Planning").await;

        assert!(!outcome.success());
        assert!(outcome.payload().is_none());
        assert!(outcome.error().unwrap().starts_with("step budget exceeded"));
        let snapshot = metrics.snapshot().await.unwrap();
        assert_eq!(snapshot.tasks_completed, 1);
        assert_eq!(snapshot.success_rate, 0.0);
    }

    #[tokio::test]
    async fn test_cancelled_operation_is_recorded_as_failed() {
        let metrics = Arc::new(MemoryMetrics::new());
        let orch = orchestrator(
            Arc::new(StubModel::new("<p>stub</p>")),
            Arc::new(StallingAgent::new()),
            metrics.clone(),
            None,
        );

        let result = tokio::time::timeout(
            Duration::from_millis(50),
            orch.create_page("Q4 Guide", "Q4 Tax Planning"),
        )
        .await;
        assert!(result.is_err());

        let mut snapshot = metrics.snapshot().await.unwrap();
        for _ in 0..50 {
            if snapshot.queue_length == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            snapshot = metrics.snapshot().await.unwrap();
        }
        assert_eq!(snapshot.queue_length, 0);
        assert_eq!(snapshot.tasks_completed, 1);
        assert_eq!(snapshot.success_rate, 0.0);
    }

    #[tokio::test]
    async fn test_create_page_with_optimization() {
        let model = Arc::new(StubModel::new("<p>stub</p>"));
        let orch = orchestrator(
            model.clone(),
            Arc::new(ScriptedAgent::new()),
            Arc::new(MemoryMetrics::new()),
            None,
        );

        let outcome = orch
            .create_page_with(ContentRequest::new("Q4 Guide", "Q4 Tax Planning"), true)
            .await;

        assert!(outcome.success());
        assert_eq!(outcome.payload().unwrap()["optimized"], true);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_update_homepage_makes_two_ordered_calls() {
        let agent = Arc::new(
            ScriptedAgent::new()
                .then_output("The homepage does not seem to exist")
                .then_output("Updated page 1272"),
        );
        let orch = orchestrator(
            Arc::new(StubModel::new("unused")),
            agent.clone(),
            Arc::new(MemoryMetrics::new()),
            Some(1272),
        );

        let outcome = orch.update_homepage("<h1>Welcome</h1>").await;

        assert!(outcome.success());
        let payload = outcome.payload().unwrap();
        assert_eq!(payload["page_id"], 1272);
        assert_eq!(payload["message"], "Homepage updated successfully");
        assert_eq!(payload["result"]["output"], "Updated page 1272");

        let instructions = agent.instructions();
        assert_eq!(
            instructions,
            vec![
                "Get all pages and find the homepage (page_id=1272)".to_string(),
                "Update page with ID 1272 with new content: <h1>Welcome</h1>".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_update_homepage_lookup_failure_aborts() {
        let agent = Arc::new(
            ScriptedAgent::new().then_fail(AgentError::Unreachable("connection refused".into())),
        );
        let orch = orchestrator(
            Arc::new(StubModel::new("unused")),
            agent.clone(),
            Arc::new(MemoryMetrics::new()),
            Some(1272),
        );

        let outcome = orch.update_homepage("<h1>Welcome</h1>").await;

        assert!(!outcome.success());
        assert_eq!(agent.instructions().len(), 1);
    }

    #[tokio::test]
    async fn test_update_homepage_requires_configured_id() {
        let agent = Arc::new(ScriptedAgent::new());
        let orch = orchestrator(
            Arc::new(StubModel::new("unused")),
            agent.clone(),
            Arc::new(MemoryMetrics::new()),
            None,
        );

        let outcome = orch.update_homepage("<h1>Welcome</h1>").await;

        assert!(!outcome.success());
        assert!(outcome.error().unwrap().contains("homepage_id"));
        assert!(agent.instructions().is_empty());
    }

    #[tokio::test]
    async fn test_optimize_seo_content() {
        let orch = orchestrator(
            Arc::new(StubModel::new("<h2>Optimized</h2>")),
            Arc::new(ScriptedAgent::new()),
            Arc::new(MemoryMetrics::new()),
            None,
        );

        let outcome = orch.optimize_seo_content("<p>draft</p>").await;

        assert!(outcome.success());
        let payload = outcome.payload().unwrap();
        assert_eq!(payload["html"], "<h2>Optimized</h2>");
        assert!(payload["content_length"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_status_on_bridge_failure() {
        let agent = Arc::new(
            ScriptedAgent::new().then_fail(AgentError::Unreachable("connection refused".into())),
        );
        let orch = orchestrator(
            Arc::new(StubModel::new("unused")),
            agent,
            Arc::new(MemoryMetrics::new()),
            None,
        );

        let status = orch.get_agent_status().await;

        assert_eq!(status.status, AgentState::Error);
        assert!(status.error.unwrap().contains("connection refused"));
        let json = serde_json::to_value(orch.get_agent_status().await).unwrap();
        assert_eq!(json["status"], "active");
    }

    #[tokio::test]
    async fn test_status_merges_metrics_and_skips_recording() {
        let metrics = Arc::new(MemoryMetrics::new());
        let agent = Arc::new(
            ScriptedAgent::new()
                .then_output("ok")
                .then_fail(AgentError::Reported("boom".into()))
                .then_output("There are 12 pages"),
        );
        let orch = orchestrator(
            Arc::new(StubModel::new("<p>stub</p>")),
            agent,
            metrics.clone(),
            None,
        );

        assert!(orch.create_page("A", "a").await.success());
        assert!(!orch.create_page("B", "b").await.success());

        let status = orch.get_agent_status().await;
        assert_eq!(status.status, AgentState::Active);
        assert_eq!(status.pages_count.as_deref(), Some("There are 12 pages"));
        assert_eq!(status.tasks_completed, 2);
        assert_eq!(status.success_rate, 50.0);
        assert_eq!(status.queue_length, 0);

        assert_eq!(metrics.snapshot().await.unwrap().tasks_completed, 2);
    }

    #[tokio::test]
    async fn test_metrics_failures_do_not_change_outcomes() {
        let orch = orchestrator(
            Arc::new(StubModel::new("<p>stub</p>")),
            Arc::new(ScriptedAgent::new()),
            Arc::new(BrokenMetrics),
            None,
        );

        assert!(orch.create_page("Q4 Guide", "Q4 Tax Planning").await.success());

        let status = orch.get_agent_status().await;
        assert_eq!(status.status, AgentState::Active);
        assert_eq!(status.tasks_completed, 0);
    }

    #[test]
    fn test_outcome_serialization() {
        let ok = serde_json::to_value(OperationOutcome::succeeded(json!({"a": 1}))).unwrap();
        assert_eq!(ok, json!({"success": true, "payload": {"a": 1}}));

        let failed = serde_json::to_value(OperationOutcome::failed("nope")).unwrap();
        assert_eq!(failed, json!({"success": false, "error": "nope"}));
    }

    #[test]
    fn test_outcome_deserialization_rejects_mixed_envelopes() {
        let ok: OperationOutcome =
            serde_json::from_value(json!({"success": true, "payload": {"a": 1}})).unwrap();
        assert_eq!(ok, OperationOutcome::succeeded(json!({"a": 1})));
        let failed: OperationOutcome =
            serde_json::from_value(json!({"success": false, "error": "nope"})).unwrap();
        assert_eq!(failed.error(), Some("nope"));

        for envelope in [
            json!({"success": true}),
            json!({"success": true, "payload": 1, "error": "nope"}),
            json!({"success": false}),
            json!({"success": false, "payload": 1, "error": "nope"}),
        ] {
            assert!(serde_json::from_value::<OperationOutcome>(envelope).is_err());
        }
    }
}
